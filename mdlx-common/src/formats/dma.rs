//! DMA chain tags and material table sentinels
//!
//! Each subpart carries a chain of 16-byte DMA tags telling the coprocessor
//! where to fetch the encoded packet payloads and which bone matrices to
//! upload before kicking each packet, plus a material table of global bone
//! references walked by the runtime.
//!
//! # Layout
//! ```text
//! DmaTag (16 bytes)
//! 0x00: qwc   u16  (transfer length in quadwords)
//! 0x02: tag   u16  (chain tag bits)
//! 0x04: addr  u32  (payload offset, or global bone index for uploads)
//! 0x08: vif   u8 x 8  (inline VIF code executed with the transfer)
//! ```

/// Chain tag bits for a reference transfer (payload or matrix upload).
pub const DMA_TAG_REF: u16 = 0x3000;

/// Chain tag bits carried by the terminator entry.
pub const DMA_TAG_END: u16 = 0x1000;

/// Inline VIF code: STCYCL with cl=1, wl=1.
pub const VIF_STCYCL_1_1: [u8; 4] = [0x01, 0x01, 0x00, 0x01];

/// Number of quadwords one bone matrix occupies in coprocessor memory.
pub const MATRIX_QWC: u16 = 4;

/// Inline VIF code: UNPACK V4-32 of one matrix to `addr` (in quadwords).
pub fn vif_unpack_v4_32(addr: u8) -> [u8; 4] {
    [addr, 0x80, MATRIX_QWC as u8, 0x6C]
}

/// Material chain sentinel: more packets follow in this subpart.
pub const MATERIAL_CHAIN_MORE: u32 = 0xFFFF_FFFF;

/// Material chain sentinel: last packet of the subpart.
pub const MATERIAL_CHAIN_END: u32 = 0;

/// One 16-byte entry of a subpart's DMA chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DmaTag {
    pub qwc: u16,
    pub tag: u16,
    pub addr: u32,
    pub vif: [u8; 8],
}

impl DmaTag {
    pub const SIZE: usize = 16;

    /// Reference tag fetching an encoded packet payload.
    ///
    /// `payload_off` is container-relative; `qwc` is the payload length in
    /// quadwords. No inline VIF code - the payload carries its own.
    pub fn payload_ref(qwc: u16, payload_off: u32) -> Self {
        Self {
            qwc,
            tag: DMA_TAG_REF,
            addr: payload_off,
            vif: [0; 8],
        }
    }

    /// Reference tag uploading one bone matrix into the packet's matrix
    /// slots.
    ///
    /// `bone_index` is the global (container-wide) bone index the runtime
    /// resolves to a matrix source; `unpack_addr` is the destination slot in
    /// coprocessor memory, in quadwords.
    pub fn bone_upload(bone_index: u32, unpack_addr: u8) -> Self {
        let mut vif = [0u8; 8];
        vif[..4].copy_from_slice(&VIF_STCYCL_1_1);
        vif[4..].copy_from_slice(&vif_unpack_v4_32(unpack_addr));
        Self {
            qwc: MATRIX_QWC,
            tag: DMA_TAG_REF,
            addr: bone_index,
            vif,
        }
    }

    /// Chain terminator: end tag plus an MSCAL starting the microprogram.
    pub fn end() -> Self {
        Self {
            qwc: 0,
            tag: DMA_TAG_END,
            addr: 0,
            vif: [0x00, 0x00, 0x00, 0x17, 0x00, 0x00, 0x00, 0x00],
        }
    }

    /// Write tag to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0x00..0x02].copy_from_slice(&self.qwc.to_le_bytes());
        bytes[0x02..0x04].copy_from_slice(&self.tag.to_le_bytes());
        bytes[0x04..0x08].copy_from_slice(&self.addr.to_le_bytes());
        bytes[0x08..0x10].copy_from_slice(&self.vif);
        bytes
    }

    /// Read tag from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            qwc: u16::from_le_bytes(bytes[0x00..0x02].try_into().ok()?),
            tag: u16::from_le_bytes(bytes[0x02..0x04].try_into().ok()?),
            addr: u32::from_le_bytes(bytes[0x04..0x08].try_into().ok()?),
            vif: bytes[0x08..0x10].try_into().ok()?,
        })
    }
}
