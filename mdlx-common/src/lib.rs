//! Shared types for the MDLX model container
//!
//! This crate provides the wire-format definitions shared between:
//! - `mdlx-export` (model conversion pipeline)
//! - downstream inspection tools
//!
//! # Modules
//!
//! - [`formats`] - container headers, bone entries, DMA tags and table sentinels

pub mod formats;

// Re-export commonly used format items
pub use formats::{
    BoneEntry, DmaTag, ModelHeader, SubpartHeader, DMA_TAG_END, DMA_TAG_REF, MATERIAL_CHAIN_END,
    MATERIAL_CHAIN_MORE, MATRIX_QWC, MODEL_KIND_SKINNED, VIF_STCYCL_1_1, vif_unpack_v4_32,
};

/// Size of the fixed in-game header region that leads the container.
///
/// The region is reserved for the runtime and written as zeroes by the
/// exporter. Every offset stored in a header or table is relative to the
/// byte immediately following it.
pub const FIXED_HEADER_SIZE: usize = 0x90;

/// Quadword size in bytes. All coprocessor transfer lengths count quadwords.
pub const QUADWORD: usize = 16;

/// Subpart sections are padded with zeroes to this boundary.
pub const SUBPART_ALIGN: usize = 16;
