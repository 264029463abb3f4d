//! Global bone table entries
//!
//! # Layout
//! ```text
//! BoneEntry (64 bytes)
//! 0x00: index        u16  (global, contiguous across the container)
//! 0x02: reserved     u16
//! 0x04: parent       i32  (global index, -1 = root)
//! 0x08: reserved     u32
//! 0x0C: reserved     u32
//! 0x10: scale        f32 x 4
//! 0x20: rotation     f32 x 4
//! 0x30: translation  f32 x 4
//! ```
//!
//! Transform values come straight from the importer; nothing here
//! renormalizes or re-bases them.

/// One entry of the container-wide bone table (64 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct BoneEntry {
    pub index: u16,
    pub res0: u16,
    /// Global index of the parent bone, -1 for roots.
    pub parent: i32,
    pub res1: u32,
    pub res2: u32,
    pub scale: [f32; 4],
    pub rotation: [f32; 4],
    pub translation: [f32; 4],
}

impl BoneEntry {
    pub const SIZE: usize = 64;

    /// Write entry to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x02].copy_from_slice(&self.index.to_le_bytes());
        bytes[0x02..0x04].copy_from_slice(&self.res0.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&self.parent.to_le_bytes());
        bytes[0x08..0x0C].copy_from_slice(&self.res1.to_le_bytes());
        bytes[0x0C..0x10].copy_from_slice(&self.res2.to_le_bytes());
        for (i, f) in self.scale.iter().enumerate() {
            bytes[0x10 + i * 4..0x14 + i * 4].copy_from_slice(&f.to_le_bytes());
        }
        for (i, f) in self.rotation.iter().enumerate() {
            bytes[0x20 + i * 4..0x24 + i * 4].copy_from_slice(&f.to_le_bytes());
        }
        for (i, f) in self.translation.iter().enumerate() {
            bytes[0x30 + i * 4..0x34 + i * 4].copy_from_slice(&f.to_le_bytes());
        }
        bytes
    }

    /// Read entry from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let read_f32x4 = |base: usize| -> Option<[f32; 4]> {
            let mut out = [0.0f32; 4];
            for (i, f) in out.iter_mut().enumerate() {
                *f = f32::from_le_bytes(bytes[base + i * 4..base + i * 4 + 4].try_into().ok()?);
            }
            Some(out)
        };
        Some(Self {
            index: u16::from_le_bytes(bytes[0x00..0x02].try_into().ok()?),
            res0: u16::from_le_bytes(bytes[0x02..0x04].try_into().ok()?),
            parent: i32::from_le_bytes(bytes[0x04..0x08].try_into().ok()?),
            res1: u32::from_le_bytes(bytes[0x08..0x0C].try_into().ok()?),
            res2: u32::from_le_bytes(bytes[0x0C..0x10].try_into().ok()?),
            scale: read_f32x4(0x10)?,
            rotation: read_f32x4(0x20)?,
            translation: read_f32x4(0x30)?,
        })
    }
}
