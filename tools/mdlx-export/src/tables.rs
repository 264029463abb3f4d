//! Per-subpart DMA chain and material table builders
//!
//! Both builders are fed packet metadata in subpart order and take the
//! mesh's bone-offset explicitly, so global bone indices are computed from
//! an accumulator threaded through the assembly rather than ambient state.

use mdlx_common::{
    DmaTag, MATERIAL_CHAIN_END, MATERIAL_CHAIN_MORE, MATRIX_QWC,
};

use crate::error::ExportError;

/// Builds one subpart's DMA chain.
///
/// Per packet: one payload reference tag, then one matrix-upload tag per
/// referenced bone. [`DmaTableBuilder::finish`] appends the single chain
/// terminator for the subpart.
#[derive(Default)]
pub struct DmaTableBuilder {
    bytes: Vec<u8>,
    entry_count: u32,
}

impl DmaTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one packet's tags.
    ///
    /// `bones` are mesh-local bone indices; `bone_offset` is the cumulative
    /// bone count of every mesh before this one, so `local + offset` is the
    /// container-wide index. `matrix_offset` is the packet's first matrix
    /// slot as reported by the encoder; bone `i` unpacks to
    /// `matrix_offset + 4*i`.
    pub fn push_packet(
        &mut self,
        payload_off: u32,
        payload_qwc: u16,
        matrix_offset: u32,
        bones: &[u32],
        bone_offset: u32,
    ) -> Result<(), ExportError> {
        self.push_tag(DmaTag::payload_ref(payload_qwc, payload_off));
        for (slot, &bone) in bones.iter().enumerate() {
            let unpack_addr = matrix_offset + slot as u32 * MATRIX_QWC as u32;
            let unpack_addr = u8::try_from(unpack_addr).map_err(|_| {
                ExportError::Encoder(format!(
                    "matrix slot {unpack_addr} does not fit the coprocessor address space"
                ))
            })?;
            self.push_tag(DmaTag::bone_upload(bone + bone_offset, unpack_addr));
        }
        Ok(())
    }

    fn push_tag(&mut self, tag: DmaTag) {
        self.bytes.extend_from_slice(&tag.to_bytes());
        self.entry_count += 1;
    }

    /// Terminate the chain and return its bytes plus the entry count
    /// (terminator included) for the subpart header.
    pub fn finish(mut self) -> (Vec<u8>, u32) {
        self.push_tag(DmaTag::end());
        (self.bytes, self.entry_count)
    }
}

/// Builds one subpart's material-reference table.
///
/// Per packet: one global bone reference per referenced bone, then a chain
/// sentinel - "more packets follow" after every packet except the last,
/// whose sentinel is the terminal zero. The table is prefixed with the
/// entry count, which covers bone references and continuation markers but
/// not the final sentinel.
#[derive(Default)]
pub struct MaterialTableBuilder {
    entries: Vec<u32>,
}

impl MaterialTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_packet(&mut self, bones: &[u32], bone_offset: u32) {
        for &bone in bones {
            self.entries.push(bone + bone_offset);
        }
        self.entries.push(MATERIAL_CHAIN_MORE);
    }

    pub fn finish(mut self) -> Vec<u8> {
        // The last packet's sentinel is the terminal one.
        match self.entries.last_mut() {
            Some(last) => *last = MATERIAL_CHAIN_END,
            None => self.entries.push(MATERIAL_CHAIN_END),
        }

        let count = (self.entries.len() - 1) as u32;
        let mut bytes = Vec::with_capacity((self.entries.len() + 1) * 4);
        bytes.extend_from_slice(&count.to_le_bytes());
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdlx_common::DMA_TAG_REF;

    #[test]
    fn test_dma_chain_two_packets() {
        let mut builder = DmaTableBuilder::new();
        builder.push_packet(0x100, 20, 0x10, &[0, 2], 5).unwrap();
        builder.push_packet(0x240, 12, 0x0C, &[1], 5).unwrap();
        let (bytes, count) = builder.finish();

        // 2 payload refs + 3 bone uploads + 1 terminator
        assert_eq!(count, 6);
        assert_eq!(bytes.len(), 6 * DmaTag::SIZE);

        let first = DmaTag::from_bytes(&bytes[0..16]).unwrap();
        assert_eq!(first, DmaTag::payload_ref(20, 0x100));
        assert_eq!(first.tag, DMA_TAG_REF);

        // Second bone of the first packet: global index 2+5, slot 0x10+4.
        let second_bone = DmaTag::from_bytes(&bytes[32..48]).unwrap();
        assert_eq!(second_bone.addr, 7);
        assert_eq!(second_bone.vif[4], 0x14);

        let terminator = DmaTag::from_bytes(&bytes[80..96]).unwrap();
        assert_eq!(terminator, DmaTag::end());
    }

    #[test]
    fn test_dma_rejects_out_of_range_matrix_slot() {
        let mut builder = DmaTableBuilder::new();
        let err = builder.push_packet(0, 4, 0x100, &[0], 0).unwrap_err();
        assert!(matches!(err, ExportError::Encoder(_)));
    }

    #[test]
    fn test_material_table_sentinels_and_count() {
        let mut builder = MaterialTableBuilder::new();
        builder.push_packet(&[0, 1], 3);
        builder.push_packet(&[1], 3);
        let bytes = builder.finish();

        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        // count, bone, bone, MORE, bone, END
        assert_eq!(words, vec![4, 3, 4, MATERIAL_CHAIN_MORE, 4, MATERIAL_CHAIN_END]);
    }

    #[test]
    fn test_material_table_single_packet_has_only_end_sentinel() {
        let mut builder = MaterialTableBuilder::new();
        builder.push_packet(&[0], 0);
        let bytes = builder.finish();
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![1, 0, MATERIAL_CHAIN_END]);
        assert!(!words[1..].contains(&MATERIAL_CHAIN_MORE));
    }
}
