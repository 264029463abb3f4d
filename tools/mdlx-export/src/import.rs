//! Geometry importer (glTF/GLB -> `SkinnedMesh`)
//!
//! Produces the read-only mesh description the packetizer consumes: ordered
//! vertices (position, UV), triangle faces, and per-bone weight lists with a
//! resolved parent hierarchy. One `SkinnedMesh` is emitted per mesh
//! primitive, and each becomes one subpart of the container.

use std::path::Path;

use hashbrown::HashMap;

use crate::error::ExportError;

/// One bone of a mesh, with the vertices it affects in source order.
#[derive(Debug, Clone)]
pub struct Bone {
    /// Mesh-local index of the parent bone, `None` for roots.
    pub parent: Option<usize>,
    /// Indices of the vertices this bone affects, in source order.
    pub weights: Vec<u32>,
    pub scale: [f32; 4],
    pub rotation: [f32; 4],
    pub translation: [f32; 4],
}

impl Bone {
    /// Root bone with an identity transform weighting every vertex.
    ///
    /// Used for unskinned meshes so packetization and matrix upload stay
    /// uniform across subparts.
    fn synthetic_root(vertex_count: usize) -> Self {
        Self {
            parent: None,
            weights: (0..vertex_count as u32).collect(),
            scale: [1.0, 1.0, 1.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Read-only input to the packetization pipeline, one per subpart.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangles as vertex index triples, in source order.
    pub faces: Vec<[u32; 3]>,
    pub bones: Vec<Bone>,
    /// Texture slot referenced by the subpart header.
    pub texture_index: u32,
}

/// Load every mesh primitive of a glTF/GLB file.
pub fn load_gltf(input: &Path) -> Result<Vec<SkinnedMesh>, ExportError> {
    let (document, buffers, _images) = gltf::import(input)
        .map_err(|e| ExportError::Import(format!("{}: {e}", input.display())))?;

    // Child -> parent node map, needed to resolve bone parents.
    let mut node_parent: HashMap<usize, usize> = HashMap::new();
    for node in document.nodes() {
        for child in node.children() {
            node_parent.insert(child.index(), node.index());
        }
    }

    let mut meshes = Vec::new();
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else { continue };
        for primitive in mesh.primitives() {
            meshes.push(import_primitive(
                &primitive,
                &buffers,
                node.skin().as_ref(),
                &node_parent,
            )?);
        }
    }

    if meshes.is_empty() {
        return Err(ExportError::Import(format!(
            "{}: no mesh primitives found",
            input.display()
        )));
    }

    tracing::info!("Imported {} mesh primitive(s) from {:?}", meshes.len(), input);
    Ok(meshes)
}

fn import_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    skin: Option<&gltf::Skin>,
    node_parent: &HashMap<usize, usize>,
) -> Result<SkinnedMesh, ExportError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ExportError::Import("mesh primitive has no positions".into()))?
        .collect();

    // Missing UV channel is non-critical: substitute zero and continue.
    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(iter) => iter.into_f32().collect(),
        None => {
            tracing::warn!("Mesh primitive has no UV channel, defaulting to (0, 0)");
            vec![[0.0, 0.0]; positions.len()]
        }
    };

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    let faces: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let joints_attr: Option<Vec<[u16; 4]>> = reader
        .read_joints(0)
        .map(|iter| iter.into_u16().collect());
    let weights_attr: Option<Vec<[f32; 4]>> = reader
        .read_weights(0)
        .map(|iter| iter.into_f32().collect());

    let bones = match (skin, joints_attr, weights_attr) {
        (Some(skin), Some(joints), Some(weights))
            if joints.len() == positions.len() && weights.len() == positions.len() =>
        {
            import_skin(skin, &joints, &weights, node_parent)
        }
        (Some(_), _, _) => {
            tracing::warn!(
                "Mesh primitive has a skin but incomplete JOINTS/WEIGHTS data, \
                 binding all vertices to a root bone"
            );
            vec![Bone::synthetic_root(positions.len())]
        }
        _ => vec![Bone::synthetic_root(positions.len())],
    };

    let texture_index = primitive.material().index().unwrap_or(0) as u32;

    Ok(SkinnedMesh {
        positions,
        uvs,
        faces,
        bones,
        texture_index,
    })
}

/// Invert per-vertex joint/weight attributes into per-bone weight lists and
/// resolve each joint's parent within the skin.
fn import_skin(
    skin: &gltf::Skin,
    joints_attr: &[[u16; 4]],
    weights_attr: &[[f32; 4]],
    node_parent: &HashMap<usize, usize>,
) -> Vec<Bone> {
    let joint_nodes: Vec<gltf::Node> = skin.joints().collect();

    // Node index -> mesh-local bone index.
    let local_of_node: HashMap<usize, usize> = joint_nodes
        .iter()
        .enumerate()
        .map(|(local, node)| (node.index(), local))
        .collect();

    // A vertex belongs to a joint's weight list when it carries a non-zero
    // weight for it. Vertices are visited in ascending order, so the lists
    // come out in source order.
    let mut weight_lists: Vec<Vec<u32>> = vec![Vec::new(); joint_nodes.len()];
    for (vertex, (joints, weights)) in joints_attr.iter().zip(weights_attr).enumerate() {
        for (joint, weight) in joints.iter().zip(weights) {
            if *weight <= 0.0 {
                continue;
            }
            let Some(&local) = local_of_node.get(&(*joint as usize)) else {
                continue;
            };
            let list = &mut weight_lists[local];
            if list.last() != Some(&(vertex as u32)) {
                list.push(vertex as u32);
            }
        }
    }

    joint_nodes
        .iter()
        .zip(weight_lists)
        .map(|(node, weights)| {
            // Nearest ancestor that is itself a joint of this skin; bones
            // whose parent cannot be resolved become roots.
            let mut parent = None;
            let mut cursor = node_parent.get(&node.index());
            while let Some(&ancestor) = cursor {
                if let Some(&local) = local_of_node.get(&ancestor) {
                    parent = Some(local);
                    break;
                }
                cursor = node_parent.get(&ancestor);
            }

            let (translation, rotation, scale) = node.transform().decomposed();
            Bone {
                parent,
                weights,
                scale: [scale[0], scale[1], scale[2], 0.0],
                rotation,
                translation: [translation[0], translation[1], translation[2], 0.0],
            }
        })
        .collect()
}
