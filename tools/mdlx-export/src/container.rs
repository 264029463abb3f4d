//! Container assembly
//!
//! Builds the final byte stream:
//!
//! ```text
//! [fixed header region, 0x90 zero bytes]
//! [model header]
//! [subpart header] x N
//! [global bone table]
//! [per subpart: packet payloads..., DMA chain, material table, padding] x N
//! ```
//!
//! Later sections' offsets are unknowable until earlier content is written,
//! so headers go down with zeroed offset fields that are backpatched once
//! their targets exist. The whole container is staged in memory and only
//! reaches disk after every pass has succeeded, so a failed run never leaves
//! a structurally invalid file behind.

use mdlx_common::{
    ModelHeader, SubpartHeader, FIXED_HEADER_SIZE, QUADWORD, SUBPART_ALIGN,
};

use crate::bones::build_bone_table;
use crate::encoder::PacketEncoder;
use crate::error::ExportError;
use crate::import::SkinnedMesh;
use crate::packet::{finalize, packetize};
use crate::tables::{DmaTableBuilder, MaterialTableBuilder};

/// Growable output buffer with a monotonic cursor and recorded-position
/// patching. All stored offsets are relative to the byte following the
/// fixed header region.
struct ContainerWriter {
    buf: Vec<u8>,
}

impl ContainerWriter {
    fn new() -> Self {
        // Pass 1: the leading region holds only format-reserved zero bytes.
        Self {
            buf: vec![0u8; FIXED_HEADER_SIZE],
        }
    }

    /// Absolute write-cursor position.
    fn position(&self) -> usize {
        self.buf.len()
    }

    /// Container-relative position of the write cursor.
    fn relative(&self) -> u32 {
        (self.buf.len() - FIXED_HEADER_SIZE) as u32
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Resolve a forward reference at an absolute position recorded earlier.
    fn patch_u32(&mut self, at: usize, value: u32) {
        self.buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn pad_to(&mut self, align: usize) {
        while self.buf.len() % align != 0 {
            self.buf.push(0);
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Assemble the full container for a list of meshes.
///
/// Meshes become subparts in order. `capacity` is the coprocessor's packet
/// buffer size in quadwords; the encoder is invoked once per packet,
/// blocking, and any failure aborts the run before anything reaches disk.
pub fn assemble<E: PacketEncoder>(
    meshes: &[SkinnedMesh],
    encoder: &E,
    capacity: usize,
) -> Result<Vec<u8>, ExportError> {
    let total_bones: usize = meshes.iter().map(|m| m.bones.len()).sum();
    if total_bones > u16::MAX as usize {
        return Err(ExportError::Import(format!(
            "model has {total_bones} bones, more than the header can describe"
        )));
    }

    let bone_table = build_bone_table(meshes);
    let mut writer = ContainerWriter::new();

    // Pass 2: model header and subpart headers, offset fields zeroed.
    let model_pos = writer.position();
    let model_header = ModelHeader::new(bone_table.len() as u16, meshes.len() as u16);
    writer.write(&model_header.to_bytes());

    let mut subpart_pos = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        subpart_pos.push(writer.position());
        writer.write(&SubpartHeader::new(mesh.texture_index).to_bytes());
    }

    // Pass 3: global bone table.
    let bone_table_off = writer.relative();
    for entry in &bone_table.entries {
        writer.write(&entry.to_bytes());
    }
    writer.patch_u32(model_pos + ModelHeader::BONE_TABLE_OFF_FIELD, bone_table_off);

    // Pass 4: per subpart, payloads then the tables that reference them.
    for (mesh_index, mesh) in meshes.iter().enumerate() {
        let bone_offset = bone_table.mesh_offset(mesh_index);
        let packets = packetize(mesh, capacity)?;

        let mut dma = DmaTableBuilder::new();
        let mut materials = MaterialTableBuilder::new();

        for packet in &packets {
            let finalized = finalize(mesh, packet);
            let encoded = encoder.encode(&finalized)?;

            let payload_qwc =
                u16::try_from(encoded.payload.len() / QUADWORD).map_err(|_| {
                    ExportError::Encoder(format!(
                        "payload of {} bytes exceeds the DMA transfer limit",
                        encoded.payload.len()
                    ))
                })?;

            let payload_off = writer.relative();
            writer.write(&encoded.payload);

            dma.push_packet(
                payload_off,
                payload_qwc,
                encoded.matrix_offset,
                &finalized.bones,
                bone_offset,
            )?;
            materials.push_packet(&finalized.bones, bone_offset);
        }

        let dma_off = writer.relative();
        let (dma_bytes, dma_count) = dma.finish();
        writer.write(&dma_bytes);

        let material_off = writer.relative();
        writer.write(&materials.finish());

        let base = subpart_pos[mesh_index];
        writer.patch_u32(base + SubpartHeader::DMA_OFF_FIELD, dma_off);
        writer.patch_u32(base + SubpartHeader::MATERIAL_OFF_FIELD, material_off);
        writer.patch_u32(base + SubpartHeader::DMA_ENTRY_COUNT_FIELD, dma_count);

        writer.pad_to(SUBPART_ALIGN);

        tracing::info!(
            "Subpart {}/{}: {} packet(s), {} DMA entries",
            mesh_index + 1,
            meshes.len(),
            packets.len(),
            dma_count
        );
    }

    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_starts_after_fixed_region() {
        let writer = ContainerWriter::new();
        assert_eq!(writer.position(), FIXED_HEADER_SIZE);
        assert_eq!(writer.relative(), 0);
    }

    #[test]
    fn test_writer_patch_and_pad() {
        let mut writer = ContainerWriter::new();
        let at = writer.position();
        writer.write(&[0u8; 4]);
        writer.write(&[0xAB; 3]);
        writer.patch_u32(at, 0x01020304);
        writer.pad_to(16);

        let bytes = writer.into_bytes();
        assert_eq!(bytes.len() % 16, 0);
        assert_eq!(&bytes[at..at + 4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bytes.last(), Some(&0));
    }
}
