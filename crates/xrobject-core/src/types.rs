//! Scene snapshot types
//!
//! The host application hands the exporter a read-only snapshot of its scene
//! graph. Nodes, materials and actions live in flat arenas on [`Scene`] and
//! reference each other through [`NodeId`] / [`MaterialId`] indices, so a
//! snapshot can be built in code or loaded from JSON.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity matrix
pub const IDENTITY_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Index of a node in [`Scene::nodes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// Index of a material in [`Scene::materials`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub usize);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "material #{}", self.0)
    }
}

/// What a scene node carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Polygon mesh, see [`SceneNode::mesh`]
    Mesh,
    /// Skeleton, see [`SceneNode::armature`]
    Armature,
    /// Editor-only helper; skipped together with its children
    Helper,
    /// Anything else (empties, cameras, lights)
    #[default]
    Other,
}

/// Modifier kind. Only armature deformers matter to the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierKind {
    Armature,
    #[default]
    Other,
}

/// Modifier attached to a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modifier {
    /// Modifier kind
    #[serde(default)]
    pub kind: ModifierKind,
    /// Bound object (the deforming armature for [`ModifierKind::Armature`])
    #[serde(default)]
    pub target: Option<NodeId>,
}

impl Modifier {
    /// Armature deformer bound to `target`
    pub fn armature(target: NodeId) -> Self {
        Self {
            kind: ModifierKind::Armature,
            target: Some(target),
        }
    }
}

/// Pre-encoded chunk baked by the host
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawChunk {
    pub id: u32,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl RawChunk {
    pub fn new(id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self { id, data: data.into() }
    }
}

/// Mesh payload of a [`NodeKind::Mesh`] node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh datablock name
    pub name: String,
    /// Material slots; an empty slot is `None`
    #[serde(default)]
    pub material_slots: Vec<Option<MaterialId>>,
    /// Slot index used by each face
    #[serde(default)]
    pub face_materials: Vec<usize>,
    /// Geometry sub-chunks baked by the host
    #[serde(default)]
    pub chunks: Vec<RawChunk>,
}

/// X-Ray extension block of a material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProps {
    /// Engine shader
    pub eshader: String,
    /// Compiler shader
    pub cshader: String,
    /// Game material
    pub gamemtl: String,
    /// Surface flags (0x01 = two-sided)
    pub flags: u32,
    /// Plugin version that created the block
    pub version: i32,
}

impl Default for MaterialProps {
    fn default() -> Self {
        Self {
            eshader: "models\\model".to_string(),
            cshader: "default".to_string(),
            gamemtl: "default".to_string(),
            flags: 0,
            version: 0,
        }
    }
}

/// Image texture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    /// Absolute path of the backing image file
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Active texture slot of a material
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub texture: Texture,
    /// UV layer the slot maps through
    #[serde(default)]
    pub uv_layer: String,
}

/// Material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    /// Unique material name
    pub name: String,
    /// X-Ray extension block, absent on foreign materials
    #[serde(default)]
    pub xray: Option<MaterialProps>,
    #[serde(default)]
    pub active_texture: Option<TextureSlot>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Named bone group (partition)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneGroup {
    pub name: String,
}

fn default_true() -> bool {
    true
}

/// A single skeleton bone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    /// Bone name
    pub name: String,
    /// Parent bone name (None for root bones)
    #[serde(default)]
    pub parent: Option<String>,
    /// Index into [`Armature::bone_groups`]
    #[serde(default)]
    pub group: Option<usize>,
    /// Non-exportable bones are invisible to every section
    #[serde(default = "default_true")]
    pub exportable: bool,
    /// Bone sub-chunks baked by the host
    #[serde(default)]
    pub chunks: Vec<RawChunk>,
}

impl Bone {
    /// Create a new exportable root bone
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            group: None,
            exportable: true,
            chunks: Vec::new(),
        }
    }
}

/// Skeleton payload of a [`NodeKind::Armature`] node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Armature {
    /// Bones in stored order
    #[serde(default)]
    pub bones: Vec<Bone>,
    /// Pose bone groups
    #[serde(default)]
    pub bone_groups: Vec<BoneGroup>,
}

impl Armature {
    /// Bones that take part in the export, in stored order
    pub fn exportable_bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.exportable)
    }
}

/// Animation clip baked by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    /// Encoded motion body
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Name lookup over [`Scene::actions`]
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry<'a> {
    actions: HashMap<&'a str, &'a Action>,
}

impl<'a> ActionRegistry<'a> {
    pub fn new(actions: &'a [Action]) -> Self {
        Self {
            actions: actions.iter().map(|a| (a.name.as_str(), a)).collect(),
        }
    }

    /// Resolve an action by name
    pub fn get(&self, name: &str) -> Result<&'a Action> {
        self.actions.get(name).copied().ok_or_else(|| Error::MissingAction {
            name: name.to_string(),
        })
    }
}

/// Ownership stamp stored on an object between exports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Revision {
    /// `\\host\user` of the first exporter, empty if never exported
    pub owner: String,
    /// Creation time (unix seconds), 0 if never exported
    pub ctime: u32,
}

impl Revision {
    /// Persist the owner pair of a written record
    pub fn update_from(&mut self, record: &RevisionRecord) {
        self.owner.clone_from(&record.owner);
        self.ctime = record.ctime;
    }
}

/// Revision record as written to the REVISION chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub owner: String,
    pub ctime: u32,
    /// Last modifier, empty when the owner exported
    pub moder: String,
    pub mtime: u32,
}

/// X-Ray object properties of an export root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectProps {
    /// Object flags bitmask
    pub flags: u32,
    /// Free-form user data
    pub userdata: String,
    /// LOD object reference
    pub lodref: String,
    /// Names of embedded motions
    pub motions: Vec<String>,
    /// Names of referenced motion files
    pub motionrefs: Vec<String>,
    /// Pre-collection motion reference string
    pub motionrefs_legacy: String,
    pub revision: Revision,
}

/// Node in the scene hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    /// Local-to-world matrix, row-major, translation in the last column
    #[serde(default = "identity")]
    pub matrix_world: [[f32; 4]; 4],
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub mesh: Option<MeshData>,
    #[serde(default)]
    pub armature: Option<Armature>,
    #[serde(default)]
    pub xray: Option<ObjectProps>,
}

fn identity() -> [[f32; 4]; 4] {
    IDENTITY_MATRIX
}

impl SceneNode {
    /// Create a childless node with an identity transform
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            matrix_world: IDENTITY_MATRIX,
            children: Vec::new(),
            modifiers: Vec::new(),
            mesh: None,
            armature: None,
            xray: None,
        }
    }

    /// Mesh node
    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        let mut node = Self::new(name, NodeKind::Mesh);
        node.mesh = Some(mesh);
        node
    }

    /// Armature node
    pub fn armature(name: impl Into<String>, armature: Armature) -> Self {
        let mut node = Self::new(name, NodeKind::Armature);
        node.armature = Some(armature);
        node
    }

    /// Check if this node is an editor helper
    pub fn is_helper(&self) -> bool {
        self.kind == NodeKind::Helper
    }
}

/// Read-only scene snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a snapshot from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Add a node without a parent
    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.add_node(node);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Get node by id
    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::invalid_reference(id.to_string()))
    }

    /// Mutable node access, for hosts building or updating a snapshot
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_reference(id.to_string()))
    }

    /// Get material by id
    pub fn material(&self, id: MaterialId) -> Result<&Material> {
        self.materials
            .get(id.0)
            .ok_or_else(|| Error::invalid_reference(id.to_string()))
    }

    /// Find the first node with the given name
    pub fn find_node(&self, name: &str) -> Result<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(NodeId)
            .ok_or_else(|| Error::NodeNotFound {
                name: name.to_string(),
            })
    }

    /// Name lookup over the scene's actions
    pub fn action_registry(&self) -> ActionRegistry<'_> {
        ActionRegistry::new(&self.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_child_links_parent() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::new("root", NodeKind::Other));
        let child = scene.add_child(root, SceneNode::new("child", NodeKind::Mesh)).unwrap();

        assert_eq!(scene.node(root).unwrap().children, vec![child]);
        assert_eq!(scene.find_node("child").unwrap(), child);
    }

    #[test]
    fn test_dangling_ids_are_errors() {
        let mut scene = Scene::new();
        assert!(scene.node(NodeId(3)).is_err());
        assert!(scene.material(MaterialId(0)).is_err());
        assert!(scene.add_child(NodeId(1), SceneNode::new("x", NodeKind::Other)).is_err());
        assert!(scene.find_node("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_material_props_defaults() {
        let props = MaterialProps::default();
        assert_eq!(props.eshader, "models\\model");
        assert_eq!(props.cshader, "default");
        assert_eq!(props.gamemtl, "default");
        assert_eq!(props.flags, 0);
    }

    #[test]
    fn test_exportable_bones_filter() {
        let mut hidden = Bone::new("ik_target");
        hidden.exportable = false;
        let armature = Armature {
            bones: vec![Bone::new("root"), hidden, Bone::new("spine")],
            bone_groups: Vec::new(),
        };

        let names: Vec<_> = armature.exportable_bones().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["root", "spine"]);
    }

    #[test]
    fn test_action_registry_lookup() {
        let actions = vec![Action { name: "idle".into(), data: vec![1] }];
        let registry = ActionRegistry::new(&actions);

        assert_eq!(registry.get("idle").unwrap().data, vec![1]);
        assert!(matches!(registry.get("run"), Err(Error::MissingAction { .. })));
    }

    #[test]
    fn test_revision_update_from_record() {
        let mut revision = Revision::default();
        revision.update_from(&RevisionRecord {
            owner: "\\\\pc\\artist".into(),
            ctime: 100,
            moder: String::new(),
            mtime: 0,
        });
        assert_eq!(revision.owner, "\\\\pc\\artist");
        assert_eq!(revision.ctime, 100);
    }

    #[test]
    fn test_scene_from_json_defaults() {
        let json = r#"{
            "nodes": [
                { "name": "root", "kind": "ARMATURE", "children": [1],
                  "armature": { "bones": [ { "name": "b0" } ] } },
                { "name": "body", "kind": "MESH",
                  "mesh": { "name": "body", "material_slots": [0, null] } }
            ],
            "materials": [ { "name": "skin", "xray": { "flags": 1 } } ]
        }"#;

        let scene = Scene::from_json(json).unwrap();
        let root = scene.node(NodeId(0)).unwrap();
        assert_eq!(root.kind, NodeKind::Armature);
        assert_eq!(root.matrix_world, IDENTITY_MATRIX);
        assert!(root.armature.as_ref().unwrap().bones[0].exportable);

        let mesh = scene.node(NodeId(1)).unwrap().mesh.as_ref().unwrap();
        assert_eq!(mesh.material_slots, vec![Some(MaterialId(0)), None]);

        let props = scene.materials[0].xray.as_ref().unwrap();
        assert_eq!(props.flags, 1);
        assert_eq!(props.gamemtl, "default");
    }
}
