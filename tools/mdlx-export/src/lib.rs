//! mdlx-export library
//!
//! Converts skinned triangle meshes into the packetized MDLX container
//! consumed by the target's fixed-function graphics coprocessor: the mesh is
//! split into capacity-bounded packets, each packet is encoded by an external
//! microcode encoder, and the results are assembled into a single byte-exact
//! container with bone, DMA and material tables.

pub mod bones;
pub mod config;
pub mod container;
pub mod encoder;
pub mod error;
pub mod import;
pub mod packet;
pub mod tables;

pub use bones::{build_bone_table, BoneTable};
pub use config::ExportManifest;
pub use container::assemble;
pub use encoder::{CommandEncoder, EncodedPacket, PacketEncoder};
pub use error::ExportError;
pub use import::{load_gltf, Bone, SkinnedMesh};
pub use packet::{finalize, packetize, worst_case_qwc, FinalizedPacket, Packet};
