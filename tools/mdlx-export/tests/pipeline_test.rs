//! Integration tests for mdlx-export
//!
//! Drives the full pipeline (packetize -> finalize -> encode -> assemble)
//! with a deterministic in-process encoder and verifies the container bytes
//! by walking its headers and tables the way the runtime would.

use mdlx_common::{
    BoneEntry, DmaTag, ModelHeader, SubpartHeader, DMA_TAG_REF, FIXED_HEADER_SIZE,
    MATERIAL_CHAIN_END, MATERIAL_CHAIN_MORE, MODEL_KIND_SKINNED, QUADWORD,
};
use mdlx_export::{
    assemble, Bone, EncodedPacket, ExportError, FinalizedPacket, PacketEncoder, SkinnedMesh,
};

/// Deterministic stand-in for the external microcode encoder.
///
/// Emits a 0x30-byte pseudo header whose first bytes fingerprint the packet
/// (vertex/bone/triangle counts), the matrix slot at the conventional 0x24
/// field, then one quadword per vertex carrying its mesh index.
struct StubEncoder;

const STUB_MATRIX_OFFSET: u32 = 0x10;

impl PacketEncoder for StubEncoder {
    fn encode(&self, packet: &FinalizedPacket) -> Result<EncodedPacket, ExportError> {
        let mut payload = vec![0u8; 0x30];
        payload[0] = packet.vertex_order.len() as u8;
        payload[1] = packet.bones.len() as u8;
        payload[2] = packet.triangles.len() as u8;
        payload[0x24..0x28].copy_from_slice(&STUB_MATRIX_OFFSET.to_le_bytes());
        for &vertex in &packet.vertex_order {
            let mut quadword = [0u8; 16];
            quadword[0..4].copy_from_slice(&vertex.to_le_bytes());
            payload.extend_from_slice(&quadword);
        }
        Ok(EncodedPacket {
            payload,
            matrix_offset: STUB_MATRIX_OFFSET,
        })
    }
}

/// Encoder that always fails, for the abort path.
struct FailingEncoder;

impl PacketEncoder for FailingEncoder {
    fn encode(&self, _packet: &FinalizedPacket) -> Result<EncodedPacket, ExportError> {
        Err(ExportError::Encoder("simulated encoder crash".into()))
    }
}

fn bone(parent: Option<usize>, weights: &[u32]) -> Bone {
    Bone {
        parent,
        weights: weights.to_vec(),
        scale: [1.0, 1.0, 1.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        translation: [0.0, 0.0, 0.0, 0.0],
    }
}

/// 4 vertices, 2 faces, 2 bones - fits one packet at default capacity.
fn two_bone_quad() -> SkinnedMesh {
    SkinnedMesh {
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        faces: vec![[0, 1, 2], [0, 2, 3]],
        bones: vec![bone(None, &[0, 1]), bone(Some(0), &[2, 3])],
        texture_index: 1,
    }
}

/// 3 disjoint faces over one bone - splits into 2 packets at capacity 39.
fn splitting_mesh() -> SkinnedMesh {
    SkinnedMesh {
        positions: vec![[0.0; 3]; 9],
        uvs: vec![[0.0; 2]; 9],
        faces: vec![[0, 1, 2], [3, 4, 5], [6, 7, 8]],
        bones: vec![bone(None, &[0, 1, 2, 3, 4, 5, 6, 7, 8])],
        texture_index: 0,
    }
}

fn abs(container_relative: u32) -> usize {
    FIXED_HEADER_SIZE + container_relative as usize
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[test]
fn test_fixed_header_region_is_zeroed() {
    let container = assemble(&[two_bone_quad()], &StubEncoder, 100).unwrap();
    assert!(container[..FIXED_HEADER_SIZE].iter().all(|&b| b == 0));
}

#[test]
fn test_model_header_and_bone_table() {
    let meshes = vec![two_bone_quad(), splitting_mesh()];
    let container = assemble(&meshes, &StubEncoder, 100).unwrap();

    let header = ModelHeader::from_bytes(&container[FIXED_HEADER_SIZE..]).unwrap();
    assert_eq!(header.kind, MODEL_KIND_SKINNED);
    assert_eq!(header.bone_count, 3);
    assert_eq!(header.subpart_count, 2);
    assert_eq!(header.aux_table_off, 0);

    // The bone table sits right after the model and subpart headers.
    let expected_off = (ModelHeader::SIZE + 2 * SubpartHeader::SIZE) as u32;
    assert_eq!(header.bone_table_off, expected_off);

    // Contiguous global indices across both meshes; parents translated.
    let table_base = abs(header.bone_table_off);
    for i in 0..3 {
        let entry =
            BoneEntry::from_bytes(&container[table_base + i * BoneEntry::SIZE..]).unwrap();
        assert_eq!(entry.index, i as u16);
    }
    let second = BoneEntry::from_bytes(&container[table_base + BoneEntry::SIZE..]).unwrap();
    assert_eq!(second.parent, 0);
    let third = BoneEntry::from_bytes(&container[table_base + 2 * BoneEntry::SIZE..]).unwrap();
    assert_eq!(third.parent, -1);
}

#[test]
fn test_subpart_offsets_point_at_their_sections() {
    let meshes = vec![two_bone_quad(), splitting_mesh()];
    let container = assemble(&meshes, &StubEncoder, 100).unwrap();

    for subpart in 0..2 {
        let header_at = FIXED_HEADER_SIZE + ModelHeader::SIZE + subpart * SubpartHeader::SIZE;
        let header = SubpartHeader::from_bytes(&container[header_at..]).unwrap();

        // The DMA chain's first tag is the first payload reference; follow
        // it back to the payload and check the stub's fingerprint.
        let first_tag = DmaTag::from_bytes(&container[abs(header.dma_off)..]).unwrap();
        assert_eq!(first_tag.tag, DMA_TAG_REF);
        let payload = &container[abs(first_tag.addr)..];
        assert_eq!(payload[1], meshes[subpart].bones.len() as u8);
        assert_eq!(
            first_tag.qwc as usize * QUADWORD,
            0x30 + payload[0] as usize * QUADWORD
        );

        // The chain's last entry is the terminator, and it is the only one.
        let chain_base = abs(header.dma_off);
        let entries: Vec<DmaTag> = (0..header.dma_entry_count as usize)
            .map(|i| DmaTag::from_bytes(&container[chain_base + i * DmaTag::SIZE..]).unwrap())
            .collect();
        let terminators = entries.iter().filter(|t| **t == DmaTag::end()).count();
        assert_eq!(terminators, 1);
        assert_eq!(entries.last(), Some(&DmaTag::end()));

        // Material table starts right after the chain.
        assert_eq!(
            header.material_off as usize,
            header.dma_off as usize + entries.len() * DmaTag::SIZE
        );
    }
}

#[test]
fn test_texture_index_lands_in_subpart_header() {
    let container = assemble(&[two_bone_quad()], &StubEncoder, 100).unwrap();
    let header =
        SubpartHeader::from_bytes(&container[FIXED_HEADER_SIZE + ModelHeader::SIZE..]).unwrap();
    assert_eq!(header.texture_index, 1);
}

#[test]
fn test_forced_split_dma_chain_shape() {
    // Capacity 39 rejects the third face after two accepted ones.
    let container = assemble(&[splitting_mesh()], &StubEncoder, 39).unwrap();
    let header =
        SubpartHeader::from_bytes(&container[FIXED_HEADER_SIZE + ModelHeader::SIZE..]).unwrap();

    // 2 payload refs + 1 bone upload each + 1 terminator.
    assert_eq!(header.dma_entry_count, 5);

    let chain_base = abs(header.dma_off);
    let tags: Vec<DmaTag> = (0..5)
        .map(|i| DmaTag::from_bytes(&container[chain_base + i * DmaTag::SIZE..]).unwrap())
        .collect();

    let payload_refs: Vec<&DmaTag> = tags.iter().filter(|t| t.vif == [0; 8]).collect();
    assert_eq!(payload_refs.len(), 2);

    // Both payloads fingerprint their face counts: 2 faces then 1.
    assert_eq!(container[abs(payload_refs[0].addr) + 2], 2);
    assert_eq!(container[abs(payload_refs[1].addr) + 2], 1);

    // Payloads are consecutive.
    assert_eq!(
        payload_refs[1].addr,
        payload_refs[0].addr + payload_refs[0].qwc as u32 * QUADWORD as u32
    );
}

#[test]
fn test_material_chain_sentinels() {
    let container = assemble(&[splitting_mesh()], &StubEncoder, 39).unwrap();
    let header =
        SubpartHeader::from_bytes(&container[FIXED_HEADER_SIZE + ModelHeader::SIZE..]).unwrap();

    let base = abs(header.material_off);
    // count prefix: 2 bone refs + 1 continuation marker
    assert_eq!(read_u32(&container, base), 3);
    assert_eq!(read_u32(&container, base + 4), 0); // bone 0, first packet
    assert_eq!(read_u32(&container, base + 8), MATERIAL_CHAIN_MORE);
    assert_eq!(read_u32(&container, base + 12), 0); // bone 0, second packet
    assert_eq!(read_u32(&container, base + 16), MATERIAL_CHAIN_END);
}

#[test]
fn test_global_bone_indices_in_second_subpart() {
    let meshes = vec![two_bone_quad(), splitting_mesh()];
    let container = assemble(&meshes, &StubEncoder, 100).unwrap();

    let header_at = FIXED_HEADER_SIZE + ModelHeader::SIZE + SubpartHeader::SIZE;
    let header = SubpartHeader::from_bytes(&container[header_at..]).unwrap();

    // The splitting mesh's only bone sits after the quad's two bones.
    let bone_tag =
        DmaTag::from_bytes(&container[abs(header.dma_off) + DmaTag::SIZE..]).unwrap();
    assert_eq!(bone_tag.qwc, 4);
    assert_eq!(bone_tag.addr, 2);
    assert_eq!(bone_tag.vif[4], STUB_MATRIX_OFFSET as u8);

    let material_base = abs(header.material_off);
    assert_eq!(read_u32(&container, material_base + 4), 2);
}

#[test]
fn test_subparts_are_quadword_aligned() {
    let meshes = vec![two_bone_quad(), splitting_mesh(), two_bone_quad()];
    let container = assemble(&meshes, &StubEncoder, 100).unwrap();
    assert_eq!(container.len() % 16, 0);

    // Every payload reference lands on a quadword boundary: the first
    // payload of each subpart starts where the previous subpart's padding
    // ended.
    for subpart in 0..3 {
        let header_at = FIXED_HEADER_SIZE + ModelHeader::SIZE + subpart * SubpartHeader::SIZE;
        let header = SubpartHeader::from_bytes(&container[header_at..]).unwrap();
        let first_tag = DmaTag::from_bytes(&container[abs(header.dma_off)..]).unwrap();
        assert_eq!(abs(first_tag.addr) % 16, 0);
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let meshes = vec![two_bone_quad(), splitting_mesh()];
    let first = assemble(&meshes, &StubEncoder, 100).unwrap();
    let second = assemble(&meshes, &StubEncoder, 100).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_capacity_overflow_is_reported() {
    let err = assemble(&[two_bone_quad()], &StubEncoder, 23).unwrap_err();
    assert!(matches!(err, ExportError::CapacityOverflow { .. }));
}

#[test]
fn test_encoder_failure_aborts_assembly() {
    let err = assemble(&[two_bone_quad()], &FailingEncoder, 100).unwrap_err();
    assert!(matches!(err, ExportError::Encoder(_)));
}
