//! MDLX binary container formats
//!
//! POD layouts for the skinned-model container consumed by the coprocessor.
//! No magic bytes - the container is identified by context. All multi-byte
//! fields are little-endian, and all stored offsets are relative to the byte
//! following the fixed leading header region (`crate::FIXED_HEADER_SIZE`).

pub mod bone;
pub mod dma;
pub mod model;

pub use bone::*;
pub use dma::*;
pub use model::*;
