//! Mesh, bone and motion encoders
//!
//! The object exporter only fixes where geometry, bones and motions go in
//! the file. Their payloads come from these encoders, so a host with its own
//! geometry pipeline plugs in here. The `Baked*` implementations copy
//! payloads that the host already baked into the snapshot.

use std::collections::{HashMap, HashSet};

use xrobject_core::{Action, Bone, Error, NodeId, Result, Scene};
use xrobject_formats::{ChunkedWriter, PackedWriter};

use crate::options::ObjectExportOptions;

/// Output of a [`MeshEncoder`]
#[derive(Debug, Default)]
pub struct EncodedMesh {
    /// Mesh sub-chunks
    pub writer: ChunkedWriter,
    /// Names of materials actually used by faces
    pub used_materials: HashSet<String>,
}

/// Encodes one mesh node
pub trait MeshEncoder {
    /// Encode `node` relative to the export `root`
    fn encode(
        &self,
        scene: &Scene,
        node: NodeId,
        root: NodeId,
        options: &ObjectExportOptions,
    ) -> Result<EncodedMesh>;
}

/// Encodes one bone of an armature
pub trait BoneEncoder {
    /// Append the bone's writer to `writers` and record its index in `bone_map`
    fn encode(
        &self,
        scene: &Scene,
        armature: NodeId,
        root: NodeId,
        bone: &Bone,
        writers: &mut Vec<ChunkedWriter>,
        bone_map: &mut HashMap<String, usize>,
        options: &ObjectExportOptions,
    ) -> Result<()>;
}

/// Encodes the embedded motions of a skeleton
pub trait MotionEncoder {
    /// Write `actions` (sorted, deduplicated) for `armature` into `writer`
    fn encode(
        &self,
        writer: &mut PackedWriter,
        actions: &[&Action],
        scene: &Scene,
        armature: NodeId,
    ) -> Result<()>;
}

/// Copies [`MeshData::chunks`](xrobject_core::MeshData::chunks) and derives
/// used materials from the face slot indices
#[derive(Debug, Clone, Copy, Default)]
pub struct BakedMeshEncoder;

impl MeshEncoder for BakedMeshEncoder {
    fn encode(
        &self,
        scene: &Scene,
        node: NodeId,
        _root: NodeId,
        _options: &ObjectExportOptions,
    ) -> Result<EncodedMesh> {
        let node = scene.node(node)?;
        let mesh = node
            .mesh
            .as_ref()
            .ok_or_else(|| Error::missing_field(format!("mesh data of '{}'", node.name)))?;

        let mut writer = ChunkedWriter::new();
        for chunk in &mesh.chunks {
            writer.put(chunk.id, &chunk.data);
        }

        let mut used_materials = HashSet::new();
        for &slot_index in &mesh.face_materials {
            let slot = mesh.material_slots.get(slot_index).ok_or_else(|| {
                Error::invalid_reference(format!(
                    "material slot {slot_index} of mesh '{}'",
                    mesh.name
                ))
            })?;
            if let Some(material) = slot {
                used_materials.insert(scene.material(*material)?.name.clone());
            }
        }

        Ok(EncodedMesh {
            writer,
            used_materials,
        })
    }
}

/// Copies [`Bone::chunks`]; the bone map index is the position in `writers`
#[derive(Debug, Clone, Copy, Default)]
pub struct BakedBoneEncoder;

impl BoneEncoder for BakedBoneEncoder {
    fn encode(
        &self,
        _scene: &Scene,
        _armature: NodeId,
        _root: NodeId,
        bone: &Bone,
        writers: &mut Vec<ChunkedWriter>,
        bone_map: &mut HashMap<String, usize>,
        _options: &ObjectExportOptions,
    ) -> Result<()> {
        let mut writer = ChunkedWriter::new();
        for chunk in &bone.chunks {
            writer.put(chunk.id, &chunk.data);
        }
        bone_map.insert(bone.name.clone(), writers.len());
        writers.push(writer);
        Ok(())
    }
}

/// Writes `u32 count` followed by each action's baked body
#[derive(Debug, Clone, Copy, Default)]
pub struct BakedMotionEncoder;

impl MotionEncoder for BakedMotionEncoder {
    fn encode(
        &self,
        writer: &mut PackedWriter,
        actions: &[&Action],
        _scene: &Scene,
        _armature: NodeId,
    ) -> Result<()> {
        writer.put_u32(actions.len() as u32);
        for action in actions {
            writer.put_bytes(&action.data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrobject_core::{Material, MeshData, RawChunk, SceneNode};

    fn mesh_scene(face_materials: Vec<usize>) -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let used = scene.add_material(Material::new("used"));
        let unused = scene.add_material(Material::new("unused"));
        let node = scene.add_node(SceneNode::mesh(
            "cube",
            MeshData {
                name: "cube".into(),
                material_slots: vec![Some(used), Some(unused), None],
                face_materials,
                chunks: vec![RawChunk::new(0x1000, vec![1, 2])],
            },
        ));
        (scene, node)
    }

    #[test]
    fn test_baked_mesh_used_materials() {
        let (scene, node) = mesh_scene(vec![0, 0, 2]);
        let encoded = BakedMeshEncoder
            .encode(&scene, node, node, &ObjectExportOptions::default())
            .unwrap();

        assert_eq!(encoded.used_materials.len(), 1);
        assert!(encoded.used_materials.contains("used"));
        assert_eq!(encoded.writer.data(), &[0x00, 0x10, 0, 0, 2, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_baked_mesh_bad_slot() {
        let (scene, node) = mesh_scene(vec![5]);
        let result = BakedMeshEncoder.encode(&scene, node, node, &ObjectExportOptions::default());
        assert!(matches!(result, Err(Error::InvalidReference { .. })));
    }

    #[test]
    fn test_baked_mesh_without_mesh_data() {
        let mut scene = Scene::new();
        let node = scene.add_node(SceneNode::new("broken", xrobject_core::NodeKind::Mesh));
        let result = BakedMeshEncoder.encode(&scene, node, node, &ObjectExportOptions::default());
        assert!(matches!(result, Err(Error::MissingField { .. })));
    }

    #[test]
    fn test_baked_bone_map_indices() {
        let scene = Scene::new();
        let mut writers = vec![ChunkedWriter::new()];
        let mut bone_map = HashMap::new();

        BakedBoneEncoder
            .encode(
                &scene,
                NodeId(0),
                NodeId(0),
                &Bone::new("spine"),
                &mut writers,
                &mut bone_map,
                &ObjectExportOptions::default(),
            )
            .unwrap();

        assert_eq!(writers.len(), 2);
        assert_eq!(bone_map["spine"], 1);
    }

    #[test]
    fn test_baked_motions_count_prefix() {
        let idle = Action { name: "idle".into(), data: vec![0xAB] };
        let mut writer = PackedWriter::new();
        BakedMotionEncoder
            .encode(&mut writer, &[&idle], &Scene::new(), NodeId(0))
            .unwrap();

        assert_eq!(writer.data(), &[1, 0, 0, 0, 0xAB]);
    }
}
