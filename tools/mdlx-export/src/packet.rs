//! Mesh packetization
//!
//! Splits a mesh's face list into ordered, capacity-bounded packets
//! ([`packetize`]) and prepares each packet for the microcode encoder
//! ([`finalize`]): vertices are regrouped by the bone that introduces them,
//! because skinning uploads are per-bone-contiguous, and face indices are
//! remapped into the packet-local order.

use hashbrown::HashSet;

use crate::error::ExportError;
use crate::import::SkinnedMesh;

/// A capacity-bounded bundle of faces, the unit the encoder consumes.
///
/// Face order matches the mesh; vertex and bone lists are distinct indices
/// in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    /// Mesh face indices, original relative order preserved.
    pub faces: Vec<u32>,
    /// Distinct mesh vertex indices in first-seen order.
    pub vertices: Vec<u32>,
    /// Distinct mesh bone indices in first-seen order.
    pub bones: Vec<u32>,
}

/// Worst-case packet size in quadwords.
///
/// Per-entry costs: header 4 qwc, each bone 1/4 qwc of indices plus 4 qwc of
/// matrix upload, each vertex 1 qwc, each face 3 qwc (UVs and flags ride
/// along). The candidate face is assumed to contribute 3 new vertices and 3
/// new bones, so the estimate over-counts and the coprocessor buffer can
/// never be exceeded, at the cost of occasionally splitting early.
pub fn worst_case_qwc(bones: usize, vertices: usize, faces: usize) -> usize {
    (bones + 3).div_ceil(4) + 4 * (bones + 3) + (vertices + 3) + (faces + 1) * 3 + 4
}

/// Split a mesh's faces into packets whose worst-case cost stays below
/// `capacity` quadwords.
///
/// The partition is greedy and order-preserving: faces are taken in source
/// order, and a face that does not fit closes the current packet and opens
/// the next one. The packets cover the face list exactly once each.
pub fn packetize(mesh: &SkinnedMesh, capacity: usize) -> Result<Vec<Packet>, ExportError> {
    // Membership sets for the bone scan; weight lists keep their order for
    // the finalizer.
    let weight_sets: Vec<HashSet<u32>> = mesh
        .bones
        .iter()
        .map(|bone| bone.weights.iter().copied().collect())
        .collect();

    let mut packets = Vec::new();
    let mut current = Packet::default();

    for (face_index, face) in mesh.faces.iter().enumerate() {
        loop {
            let cost = worst_case_qwc(
                current.bones.len(),
                current.vertices.len(),
                current.faces.len(),
            );
            if cost < capacity {
                break;
            }
            if current.faces.is_empty() {
                // Even an empty packet cannot take one more face. Retrying
                // would never terminate, so report and stop.
                return Err(ExportError::CapacityOverflow { capacity, cost });
            }
            packets.push(std::mem::take(&mut current));
        }

        current.faces.push(face_index as u32);

        // Every bone weighting any corner of the face is used by the
        // packet, scanned in mesh bone order.
        for (bone_index, weights) in weight_sets.iter().enumerate() {
            if face.iter().any(|v| weights.contains(v))
                && !current.bones.contains(&(bone_index as u32))
            {
                current.bones.push(bone_index as u32);
            }
        }

        for &vertex in face {
            if !current.vertices.contains(&vertex) {
                current.vertices.push(vertex);
            }
        }
    }

    // The trailing partial packet is emitted even when far below capacity.
    if !current.faces.is_empty() {
        packets.push(current);
    }

    tracing::debug!(
        "Packetized {} faces into {} packet(s)",
        mesh.faces.len(),
        packets.len()
    );
    Ok(packets)
}

/// A packet reordered and remapped for the encoder.
#[derive(Debug, Clone)]
pub struct FinalizedPacket {
    /// Mesh vertex indices in upload order, grouped by introducing bone.
    pub vertex_order: Vec<u32>,
    /// Positions gathered in `vertex_order`.
    pub positions: Vec<[f32; 3]>,
    /// UVs gathered in `vertex_order`.
    pub uvs: Vec<[f32; 2]>,
    /// Mesh-local bone indices, first-seen order (copied from the packet).
    pub bones: Vec<u32>,
    /// Per bone of `bones`, how many packet vertices its weight list holds.
    /// A vertex weighted by several bones counts for each of them.
    pub bone_vertex_counts: Vec<u32>,
    /// Faces remapped to 1-based positions within `vertex_order`.
    pub triangles: Vec<[u16; 3]>,
}

/// Reorder a packet's vertices by bone grouping and remap its faces.
///
/// Bones are walked in the packet's first-seen order; each bone appends the
/// packet vertices of its weight list (source order) that are not placed
/// yet. Vertices no packet bone weights are appended at the end so that
/// every packet vertex appears exactly once.
pub fn finalize(mesh: &SkinnedMesh, packet: &Packet) -> FinalizedPacket {
    let in_packet: HashSet<u32> = packet.vertices.iter().copied().collect();
    let mut placed: HashSet<u32> = HashSet::with_capacity(packet.vertices.len());
    let mut vertex_order: Vec<u32> = Vec::with_capacity(packet.vertices.len());

    let mut bone_vertex_counts = Vec::with_capacity(packet.bones.len());
    for &bone in &packet.bones {
        let weights = &mesh.bones[bone as usize].weights;
        let mut count = 0u32;
        for &vertex in weights {
            if !in_packet.contains(&vertex) {
                continue;
            }
            count += 1;
            if placed.insert(vertex) {
                vertex_order.push(vertex);
            }
        }
        bone_vertex_counts.push(count);
    }

    for &vertex in &packet.vertices {
        if placed.insert(vertex) {
            tracing::warn!("Vertex {vertex} is not weighted by any bone, appending to upload order");
            vertex_order.push(vertex);
        }
    }

    let triangles = packet
        .faces
        .iter()
        .map(|&face| {
            let corners = mesh.faces[face as usize];
            // Linear scan is fine, packets are capacity-bounded.
            corners.map(|corner| {
                let slot = vertex_order
                    .iter()
                    .position(|&v| v == corner)
                    .expect("packet vertex missing from upload order");
                (slot + 1) as u16
            })
        })
        .collect();

    FinalizedPacket {
        positions: vertex_order
            .iter()
            .map(|&v| mesh.positions[v as usize])
            .collect(),
        uvs: vertex_order.iter().map(|&v| mesh.uvs[v as usize]).collect(),
        vertex_order,
        bones: packet.bones.clone(),
        bone_vertex_counts,
        triangles,
    }
}
