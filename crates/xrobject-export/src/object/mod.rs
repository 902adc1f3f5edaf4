//! X-Ray object export
//!
//! [`ObjectExporter`] turns the hierarchy below one root node into an object
//! body. Sections are always written in the same order:
//!
//! | # | Section | Present |
//! |---|---------|---------|
//! | 1 | VERSION | always |
//! | 2 | FLAGS | always |
//! | 3 | MESHES | always |
//! | 4 | SURFACES2 | always |
//! | 5 | BONES1 | bones collected |
//! | 6 | USERDATA | user data set |
//! | 7 | LOD_REF | LOD reference set |
//! | 8 | MOTIONS | skeleton, motion export on, encoder output |
//! | 9 | PARTITIONS1 | skeleton with non-empty bone groups |
//! | 10 | MOTION_REFS / SMOTIONS3 | motion references set |
//! | 11 | TRANSFORM | root matrix not identity |
//! | 12 | REVISION | always |

pub mod revision;
pub mod sections;
pub mod transform;
pub mod walker;

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;
use xrobject_core::{Error, NodeId, Result, ResultExt, RevisionRecord, Scene};
use xrobject_formats::{ChunkReader, ChunkedWriter, ObjectChunk};

use crate::encoders::{
    BakedBoneEncoder, BakedMeshEncoder, BakedMotionEncoder, BoneEncoder, MeshEncoder, MotionEncoder,
};
use crate::logging::instrument_export;
use crate::options::ObjectExportOptions;

use self::revision::{next_revision, write_revision, RevisionSource, SystemRevisionSource};
use self::walker::SceneWalker;

/// Counts of what went into an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub meshes: usize,
    pub bones: usize,
    pub materials: usize,
    pub armatures: usize,
}

/// Result of one export
#[derive(Debug, Clone)]
pub struct ExportedObject {
    /// Object body (the payload of the MAIN chunk)
    pub body: Vec<u8>,
    /// Revision record that was written; persist it with
    /// [`Revision::update_from`](xrobject_core::Revision::update_from)
    pub revision: RevisionRecord,
    /// Data inconsistencies resolved during export
    pub warnings: Vec<String>,
    pub stats: ExportStats,
}

impl ExportedObject {
    /// Top-level sections in written order
    pub fn sections(&self) -> Result<Vec<ObjectChunk>> {
        ChunkReader::new(&self.body)
            .map(|chunk| chunk.map(|c| c.kind()))
            .collect()
    }

    /// Bytes of a `.object` file: the body wrapped in MAIN
    pub fn to_file_bytes(&self) -> Vec<u8> {
        let mut file = ChunkedWriter::new();
        file.put(ObjectChunk::Main.id(), &self.body);
        file.into_bytes()
    }
}

/// Scene to X-Ray object exporter
pub struct ObjectExporter {
    options: ObjectExportOptions,
    mesh_encoder: Box<dyn MeshEncoder>,
    bone_encoder: Box<dyn BoneEncoder>,
    motion_encoder: Box<dyn MotionEncoder>,
    revision_source: Box<dyn RevisionSource>,
}

impl Default for ObjectExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectExporter {
    /// Create new exporter with default options and baked encoders
    pub fn new() -> Self {
        Self::with_options(ObjectExportOptions::default())
    }

    /// Create exporter with custom options
    pub fn with_options(options: ObjectExportOptions) -> Self {
        Self {
            options,
            mesh_encoder: Box::new(BakedMeshEncoder),
            bone_encoder: Box::new(BakedBoneEncoder),
            motion_encoder: Box::new(BakedMotionEncoder),
            revision_source: Box::new(SystemRevisionSource),
        }
    }

    pub fn options(&self) -> &ObjectExportOptions {
        &self.options
    }

    pub fn mesh_encoder(mut self, encoder: impl MeshEncoder + 'static) -> Self {
        self.mesh_encoder = Box::new(encoder);
        self
    }

    pub fn bone_encoder(mut self, encoder: impl BoneEncoder + 'static) -> Self {
        self.bone_encoder = Box::new(encoder);
        self
    }

    pub fn motion_encoder(mut self, encoder: impl MotionEncoder + 'static) -> Self {
        self.motion_encoder = Box::new(encoder);
        self
    }

    /// Replace where the revision user and time come from
    pub fn revision_source(mut self, source: impl RevisionSource + 'static) -> Self {
        self.revision_source = Box::new(source);
        self
    }

    /// Export the hierarchy below `root` into an object body
    pub fn export(&self, scene: &Scene, root: NodeId) -> Result<ExportedObject> {
        let root_node = scene.node(root).context("export root")?;
        instrument_export(&root_node.name, || {
            self.export_body(scene, root)
                .with_context(|| format!("exporting '{}'", root_node.name))
        })
    }

    fn export_body(&self, scene: &Scene, root: NodeId) -> Result<ExportedObject> {
        let root_node = scene.node(root)?;
        let xray = root_node.xray.as_ref();
        let options = &self.options;
        let mut warnings = Vec::new();
        let mut body = ChunkedWriter::new();

        sections::write_version(&mut body);
        sections::write_flags(&mut body, xray);

        let collection = SceneWalker::new(
            scene,
            root,
            options,
            self.mesh_encoder.as_ref(),
            self.bone_encoder.as_ref(),
        )
        .collect()?;
        let skeleton = collection.skeleton();

        sections::write_meshes(&mut body, &collection.mesh_writers);
        sections::write_surfaces(&mut body, scene, collection.materials.iter(), options)?;
        sections::write_bones(&mut body, &collection.bone_writers);
        sections::write_user_data(&mut body, xray);
        sections::write_lod_ref(&mut body, xray);
        sections::write_motions(
            &mut body,
            scene,
            xray,
            skeleton,
            self.motion_encoder.as_ref(),
            options,
        )?;
        sections::write_partitions(&mut body, scene, skeleton)?;
        sections::write_motion_refs(&mut body, xray, options, &mut warnings);
        sections::write_transform(&mut body, &root_node.matrix_world);

        let stored = xray.map(|x| x.revision.clone()).unwrap_or_default();
        let revision = next_revision(
            &stored,
            &self.revision_source.current_user(),
            self.revision_source.current_time(),
        );
        body.put(ObjectChunk::Revision.id(), write_revision(&revision));

        let stats = ExportStats {
            meshes: collection.mesh_writers.len(),
            bones: collection.bone_writers.len(),
            materials: collection.materials.len(),
            armatures: collection.armatures.len(),
        };
        info!(
            meshes = stats.meshes,
            bones = stats.bones,
            materials = stats.materials,
            size = body.len(),
            "Exported object"
        );

        Ok(ExportedObject {
            body: body.into_bytes(),
            revision,
            warnings,
            stats,
        })
    }

    /// Export to a `.object` file
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// a failed export never leaves a partial file behind.
    pub fn export_file(
        &self,
        scene: &Scene,
        root: NodeId,
        output_path: impl AsRef<Path>,
    ) -> Result<ExportedObject> {
        let output_path = output_path.as_ref();
        let exported = self.export(scene, root)?;

        let parent = match output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut file = tempfile::NamedTempFile::new_in(parent)?;
        file.write_all(&exported.to_file_bytes())?;
        file.flush()?;
        file.persist(output_path)
            .map_err(|e| Error::Io(e.error))
            .with_context(|| format!("writing {}", output_path.display()))?;

        info!(path = %output_path.display(), "Wrote object file");
        Ok(exported)
    }
}
