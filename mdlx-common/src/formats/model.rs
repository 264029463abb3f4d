//! Model and subpart headers
//!
//! # Layout
//! ```text
//! ModelHeader (32 bytes)
//! 0x00: kind            u32  (3 = skinned model)
//! 0x04: reserved        u32
//! 0x08: reserved        u32
//! 0x0C: next_model_off  u32  (shadow-model chain, 0 when absent)
//! 0x10: bone_count      u16
//! 0x12: reserved        u16
//! 0x14: bone_table_off  u32
//! 0x18: aux_table_off   u32  (unused on this target, kept reserved)
//! 0x1C: subpart_count   u16
//! 0x1E: reserved        u16
//!
//! SubpartHeader (32 bytes)
//! 0x00: reserved         u32
//! 0x04: texture_index    u32
//! 0x08: reserved         u32
//! 0x0C: reserved         u32
//! 0x10: dma_off          u32
//! 0x14: material_off     u32
//! 0x18: dma_entry_count  u32
//! 0x1C: reserved         u32
//! ```
//!
//! Offset fields are written zeroed first and backpatched once the sections
//! they reference have been laid down.

/// Model kind stored in the header's first field for skinned models.
pub const MODEL_KIND_SKINNED: u32 = 3;

/// Container model header (32 bytes)
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ModelHeader {
    pub kind: u32,
    pub res0: u32,
    pub res1: u32,
    /// Offset of a chained shadow model, 0 when there is none.
    pub next_model_off: u32,
    /// Total bone count across every subpart.
    pub bone_count: u16,
    pub res2: u16,
    /// Offset of the global bone table.
    pub bone_table_off: u32,
    /// Offset of the auxiliary table. Unused on this target.
    pub aux_table_off: u32,
    pub subpart_count: u16,
    pub res3: u16,
}

impl ModelHeader {
    pub const SIZE: usize = 32;

    /// Byte offset of `bone_table_off` within the header, for backpatching.
    pub const BONE_TABLE_OFF_FIELD: usize = 0x14;

    pub fn new(bone_count: u16, subpart_count: u16) -> Self {
        Self {
            kind: MODEL_KIND_SKINNED,
            res0: 0,
            res1: 0,
            next_model_off: 0,
            bone_count,
            res2: 0,
            bone_table_off: 0,
            aux_table_off: 0,
            subpart_count,
            res3: 0,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x04].copy_from_slice(&self.kind.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&self.res0.to_le_bytes());
        bytes[0x08..0x0C].copy_from_slice(&self.res1.to_le_bytes());
        bytes[0x0C..0x10].copy_from_slice(&self.next_model_off.to_le_bytes());
        bytes[0x10..0x12].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes[0x12..0x14].copy_from_slice(&self.res2.to_le_bytes());
        bytes[0x14..0x18].copy_from_slice(&self.bone_table_off.to_le_bytes());
        bytes[0x18..0x1C].copy_from_slice(&self.aux_table_off.to_le_bytes());
        bytes[0x1C..0x1E].copy_from_slice(&self.subpart_count.to_le_bytes());
        bytes[0x1E..0x20].copy_from_slice(&self.res3.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            kind: u32::from_le_bytes(bytes[0x00..0x04].try_into().ok()?),
            res0: u32::from_le_bytes(bytes[0x04..0x08].try_into().ok()?),
            res1: u32::from_le_bytes(bytes[0x08..0x0C].try_into().ok()?),
            next_model_off: u32::from_le_bytes(bytes[0x0C..0x10].try_into().ok()?),
            bone_count: u16::from_le_bytes(bytes[0x10..0x12].try_into().ok()?),
            res2: u16::from_le_bytes(bytes[0x12..0x14].try_into().ok()?),
            bone_table_off: u32::from_le_bytes(bytes[0x14..0x18].try_into().ok()?),
            aux_table_off: u32::from_le_bytes(bytes[0x18..0x1C].try_into().ok()?),
            subpart_count: u16::from_le_bytes(bytes[0x1C..0x1E].try_into().ok()?),
            res3: u16::from_le_bytes(bytes[0x1E..0x20].try_into().ok()?),
        })
    }
}

/// Per-subpart header (32 bytes), one per source mesh
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SubpartHeader {
    pub res0: u32,
    pub texture_index: u32,
    pub res1: u32,
    pub res2: u32,
    /// Offset of the subpart's DMA chain.
    pub dma_off: u32,
    /// Offset of the subpart's material-reference table.
    pub material_off: u32,
    /// Number of 16-byte entries in the DMA chain, terminator included.
    pub dma_entry_count: u32,
    pub res3: u32,
}

impl SubpartHeader {
    pub const SIZE: usize = 32;

    /// Byte offsets of the backpatched fields within the header.
    pub const DMA_OFF_FIELD: usize = 0x10;
    pub const MATERIAL_OFF_FIELD: usize = 0x14;
    pub const DMA_ENTRY_COUNT_FIELD: usize = 0x18;

    pub fn new(texture_index: u32) -> Self {
        Self {
            res0: 0,
            texture_index,
            res1: 0,
            res2: 0,
            dma_off: 0,
            material_off: 0,
            dma_entry_count: 0,
            res3: 0,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x04].copy_from_slice(&self.res0.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&self.texture_index.to_le_bytes());
        bytes[0x08..0x0C].copy_from_slice(&self.res1.to_le_bytes());
        bytes[0x0C..0x10].copy_from_slice(&self.res2.to_le_bytes());
        bytes[0x10..0x14].copy_from_slice(&self.dma_off.to_le_bytes());
        bytes[0x14..0x18].copy_from_slice(&self.material_off.to_le_bytes());
        bytes[0x18..0x1C].copy_from_slice(&self.dma_entry_count.to_le_bytes());
        bytes[0x1C..0x20].copy_from_slice(&self.res3.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            res0: u32::from_le_bytes(bytes[0x00..0x04].try_into().ok()?),
            texture_index: u32::from_le_bytes(bytes[0x04..0x08].try_into().ok()?),
            res1: u32::from_le_bytes(bytes[0x08..0x0C].try_into().ok()?),
            res2: u32::from_le_bytes(bytes[0x0C..0x10].try_into().ok()?),
            dma_off: u32::from_le_bytes(bytes[0x10..0x14].try_into().ok()?),
            material_off: u32::from_le_bytes(bytes[0x14..0x18].try_into().ok()?),
            dma_entry_count: u32::from_le_bytes(bytes[0x18..0x1C].try_into().ok()?),
            res3: u32::from_le_bytes(bytes[0x1C..0x20].try_into().ok()?),
        })
    }
}
