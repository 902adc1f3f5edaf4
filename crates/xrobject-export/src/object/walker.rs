//! Scene hierarchy walk
//!
//! Collects, below an export root, the encoded meshes, the armatures they
//! are bound to and the materials their faces actually use, then encodes
//! the bones of every collected armature.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};
use xrobject_core::{Error, MaterialId, ModifierKind, NodeId, NodeKind, Result, ResultExt, Scene};
use xrobject_formats::ChunkedWriter;

use crate::encoders::{BoneEncoder, MeshEncoder};
use crate::options::ObjectExportOptions;

/// Everything the walk collected for one export root
#[derive(Debug, Default)]
pub struct SceneCollection {
    /// Encoded meshes in discovery order
    pub mesh_writers: Vec<ChunkedWriter>,
    /// Armatures in discovery order
    pub armatures: IndexSet<NodeId>,
    /// Used materials in discovery order
    pub materials: IndexSet<MaterialId>,
    /// Encoded bones of all armatures
    pub bone_writers: Vec<ChunkedWriter>,
    /// Bone name to position in `bone_writers`, per armature
    pub bone_maps: IndexMap<NodeId, HashMap<String, usize>>,
}

impl SceneCollection {
    /// Armature used for skeleton-wide sections (motions, partitions)
    pub fn skeleton(&self) -> Option<NodeId> {
        self.armatures.first().copied()
    }
}

/// Depth-first collector over a [`Scene`]
pub struct SceneWalker<'a> {
    scene: &'a Scene,
    root: NodeId,
    options: &'a ObjectExportOptions,
    mesh_encoder: &'a dyn MeshEncoder,
    bone_encoder: &'a dyn BoneEncoder,
}

impl<'a> SceneWalker<'a> {
    pub fn new(
        scene: &'a Scene,
        root: NodeId,
        options: &'a ObjectExportOptions,
        mesh_encoder: &'a dyn MeshEncoder,
        bone_encoder: &'a dyn BoneEncoder,
    ) -> Self {
        Self {
            scene,
            root,
            options,
            mesh_encoder,
            bone_encoder,
        }
    }

    /// Walk the hierarchy below the root, then encode bones
    pub fn collect(&self) -> Result<SceneCollection> {
        let mut collection = SceneCollection::default();
        self.visit(self.root, 0, &mut collection)?;
        self.collect_bones(&mut collection)?;

        debug!(
            meshes = collection.mesh_writers.len(),
            armatures = collection.armatures.len(),
            materials = collection.materials.len(),
            bones = collection.bone_writers.len(),
            "Scene walk complete"
        );
        Ok(collection)
    }

    fn visit(&self, id: NodeId, depth: usize, collection: &mut SceneCollection) -> Result<()> {
        // A tree never nests deeper than its node count
        if depth > self.scene.nodes.len() {
            return Err(Error::invalid_data(format!("cycle in hierarchy at {id}")));
        }

        let node = self.scene.node(id)?;
        if node.is_helper() {
            trace!(node = %node.name, "Skipping helper subtree");
            return Ok(());
        }

        match node.kind {
            NodeKind::Mesh => self.visit_mesh(id, collection)?,
            NodeKind::Armature => {
                collection.armatures.insert(id);
            }
            NodeKind::Helper | NodeKind::Other => {}
        }

        for &child in &node.children {
            self.visit(child, depth + 1, collection)?;
        }
        Ok(())
    }

    fn visit_mesh(&self, id: NodeId, collection: &mut SceneCollection) -> Result<()> {
        let node = self.scene.node(id)?;
        let encoded = self
            .mesh_encoder
            .encode(self.scene, id, self.root, self.options)
            .with_context(|| format!("encoding mesh '{}'", node.name))?;
        collection.mesh_writers.push(encoded.writer);

        for modifier in &node.modifiers {
            let (ModifierKind::Armature, Some(target)) = (modifier.kind, modifier.target) else {
                continue;
            };
            let target_node = self
                .scene
                .node(target)
                .with_context(|| format!("armature modifier of '{}'", node.name))?;
            if target_node.armature.is_none() {
                return Err(Error::invalid_reference(format!(
                    "armature modifier of '{}' targets '{}', which has no armature",
                    node.name, target_node.name
                )));
            }
            collection.armatures.insert(target);
        }

        let Some(mesh) = &node.mesh else {
            return Ok(());
        };
        for material in mesh.material_slots.iter().flatten() {
            if encoded
                .used_materials
                .contains(&self.scene.material(*material)?.name)
            {
                collection.materials.insert(*material);
            }
        }
        Ok(())
    }

    fn collect_bones(&self, collection: &mut SceneCollection) -> Result<()> {
        for &armature_id in &collection.armatures {
            let node = self.scene.node(armature_id)?;
            let armature = node.armature.as_ref().ok_or_else(|| {
                Error::missing_field(format!("armature data of '{}'", node.name))
            })?;

            let mut bone_map = HashMap::new();
            for bone in armature.exportable_bones() {
                self.bone_encoder
                    .encode(
                        self.scene,
                        armature_id,
                        self.root,
                        bone,
                        &mut collection.bone_writers,
                        &mut bone_map,
                        self.options,
                    )
                    .with_context(|| format!("encoding bone '{}' of '{}'", bone.name, node.name))?;
            }
            collection.bone_maps.insert(armature_id, bone_map);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::{BakedBoneEncoder, BakedMeshEncoder};
    use xrobject_core::{Armature, Bone, Material, MeshData, Modifier, SceneNode};

    fn collect(scene: &Scene, root: NodeId) -> Result<SceneCollection> {
        let options = ObjectExportOptions::default();
        SceneWalker::new(scene, root, &options, &BakedMeshEncoder, &BakedBoneEncoder).collect()
    }

    fn mesh(slots: Vec<Option<MaterialId>>, faces: Vec<usize>) -> MeshData {
        MeshData {
            name: "mesh".into(),
            material_slots: slots,
            face_materials: faces,
            chunks: Vec::new(),
        }
    }

    #[test]
    fn test_collects_in_preorder() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root", NodeKind::Other));
        let a = scene.add_child(root, SceneNode::mesh("a", mesh(vec![], vec![]))).unwrap();
        scene.add_child(a, SceneNode::mesh("a1", mesh(vec![], vec![]))).unwrap();
        scene.add_child(root, SceneNode::mesh("b", mesh(vec![], vec![]))).unwrap();

        let collection = collect(&scene, root).unwrap();
        assert_eq!(collection.mesh_writers.len(), 3);
        assert!(collection.skeleton().is_none());
    }

    #[test]
    fn test_helper_subtree_skipped() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root", NodeKind::Other));
        let helper = scene.add_child(root, SceneNode::new("helper", NodeKind::Helper)).unwrap();
        scene.add_child(helper, SceneNode::mesh("hidden", mesh(vec![], vec![]))).unwrap();

        assert!(collect(&scene, root).unwrap().mesh_writers.is_empty());
    }

    #[test]
    fn test_only_used_materials() {
        let mut scene = Scene::new();
        let used = scene.add_material(Material::new("used"));
        let unused = scene.add_material(Material::new("unused"));
        let root = scene.add_node(SceneNode::mesh("m", mesh(vec![Some(unused), None, Some(used)], vec![2])));

        let collection = collect(&scene, root).unwrap();
        assert_eq!(collection.materials.iter().copied().collect::<Vec<_>>(), vec![used]);
    }

    #[test]
    fn test_modifier_and_direct_armatures() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root", NodeKind::Other));

        let mut first = Armature::default();
        first.bones.push(Bone::new("a"));
        let mut hidden = Bone::new("ik");
        hidden.exportable = false;
        first.bones.push(hidden);
        first.bones.push(Bone::new("b"));
        let mut second = Armature::default();
        second.bones.push(Bone::new("c"));

        let mut body = SceneNode::mesh("body", mesh(vec![], vec![]));
        let first_id = NodeId(2);
        body.modifiers.push(Modifier::armature(first_id));
        body.modifiers.push(Modifier { kind: ModifierKind::Armature, target: None });
        scene.add_child(root, body).unwrap();
        assert_eq!(scene.add_child(root, SceneNode::armature("first", first)).unwrap(), first_id);
        let second_id = scene.add_child(root, SceneNode::armature("second", second)).unwrap();

        let collection = collect(&scene, root).unwrap();
        assert_eq!(collection.skeleton(), Some(first_id));
        assert_eq!(collection.armatures.len(), 2);
        assert_eq!(collection.bone_writers.len(), 3);
        assert_eq!(collection.bone_maps[&first_id].len(), 2);
        assert_eq!(collection.bone_maps[&first_id]["b"], 1);
        assert!(!collection.bone_maps[&first_id].contains_key("ik"));
        assert_eq!(collection.bone_maps[&second_id]["c"], 2);
    }

    #[test]
    fn test_dangling_modifier_target() {
        let mut scene = Scene::new();
        let mut body = SceneNode::mesh("body", mesh(vec![], vec![]));
        body.modifiers.push(Modifier::armature(NodeId(42)));
        let root = scene.add_node(body);

        let err = collect(&scene, root).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_cycle_is_error() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root", NodeKind::Other));
        scene.node_mut(root).unwrap().children.push(root);

        assert!(matches!(collect(&scene, root), Err(Error::InvalidData { .. })));
    }
}
