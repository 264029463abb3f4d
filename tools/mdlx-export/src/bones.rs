//! Global bone table
//!
//! Flattens every mesh's bones into one contiguous, container-wide table.
//! The per-mesh offsets it records are the accumulator the DMA and material
//! builders use to turn mesh-local bone indices into global ones.

use mdlx_common::BoneEntry;

use crate::import::SkinnedMesh;

/// The container-wide bone table plus each mesh's base index within it.
pub struct BoneTable {
    pub entries: Vec<BoneEntry>,
    mesh_offsets: Vec<u32>,
}

impl BoneTable {
    /// Global index of the given mesh's first bone:
    /// the sum of the bone counts of every mesh before it.
    pub fn mesh_offset(&self, mesh_index: usize) -> u32 {
        self.mesh_offsets[mesh_index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Concatenate every mesh's bones in mesh order.
///
/// Each entry's global index is its position in the concatenated table.
/// Mesh-local parent references are translated to global indices;
/// unresolved parents become roots. Transforms pass through unmodified.
pub fn build_bone_table(meshes: &[SkinnedMesh]) -> BoneTable {
    let mut entries = Vec::new();
    let mut mesh_offsets = Vec::with_capacity(meshes.len());
    let mut offset = 0u32;

    for mesh in meshes {
        mesh_offsets.push(offset);
        for (local, bone) in mesh.bones.iter().enumerate() {
            entries.push(BoneEntry {
                index: offset as u16 + local as u16,
                res0: 0,
                parent: bone
                    .parent
                    .map(|p| (offset + p as u32) as i32)
                    .unwrap_or(-1),
                res1: 0,
                res2: 0,
                scale: bone.scale,
                rotation: bone.rotation,
                translation: bone.translation,
            });
        }
        offset += mesh.bones.len() as u32;
    }

    BoneTable {
        entries,
        mesh_offsets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::Bone;

    fn mesh_with_bones(bones: Vec<Bone>) -> SkinnedMesh {
        SkinnedMesh {
            positions: vec![[0.0; 3]],
            uvs: vec![[0.0; 2]],
            faces: vec![],
            bones,
            texture_index: 0,
        }
    }

    fn bone(parent: Option<usize>) -> Bone {
        Bone {
            parent,
            weights: vec![0],
            scale: [1.0, 1.0, 1.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0, 0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_global_indices_are_contiguous() {
        let meshes = vec![
            mesh_with_bones(vec![bone(None), bone(Some(0))]),
            mesh_with_bones(vec![bone(None), bone(Some(0)), bone(Some(1))]),
            mesh_with_bones(vec![bone(None)]),
        ];
        let table = build_bone_table(&meshes);

        assert_eq!(table.len(), 6);
        for (i, entry) in table.entries.iter().enumerate() {
            assert_eq!(entry.index, i as u16);
        }
        assert_eq!(table.mesh_offset(0), 0);
        assert_eq!(table.mesh_offset(1), 2);
        assert_eq!(table.mesh_offset(2), 5);
    }

    #[test]
    fn test_parents_are_translated_to_global_indices() {
        let meshes = vec![
            mesh_with_bones(vec![bone(None), bone(Some(0))]),
            mesh_with_bones(vec![bone(None), bone(Some(0))]),
        ];
        let table = build_bone_table(&meshes);

        assert_eq!(table.entries[0].parent, -1);
        assert_eq!(table.entries[1].parent, 0);
        assert_eq!(table.entries[2].parent, -1);
        // Second mesh's bone 1 points at its own root, globally index 2.
        assert_eq!(table.entries[3].parent, 2);
    }

    #[test]
    fn test_transforms_pass_through() {
        let mut b = bone(None);
        b.translation = [1.0, 2.0, 3.0, 0.0];
        b.rotation = [0.1, 0.2, 0.3, 0.9];
        let table = build_bone_table(&[mesh_with_bones(vec![b])]);
        assert_eq!(table.entries[0].translation, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(table.entries[0].rotation, [0.1, 0.2, 0.3, 0.9]);
    }
}
