//! xrobject Export Pipeline
//!
//! Turns a read-only scene snapshot into an X-Ray `.object` body:
//! - walks the hierarchy below an export root collecting meshes,
//!   armatures and used materials
//! - encodes every object section in the fixed format order
//! - stamps ownership revision and writes files atomically
//!
//! Geometry, bones and motions are encoded by pluggable
//! [`MeshEncoder`] / [`BoneEncoder`] / [`MotionEncoder`] implementations;
//! the `Baked*` encoders copy payloads the host baked into the snapshot.

pub mod encoders;
pub mod logging;
pub mod object;
pub mod options;
pub mod texture;

pub use encoders::{
    BakedBoneEncoder, BakedMeshEncoder, BakedMotionEncoder, BoneEncoder, EncodedMesh,
    MeshEncoder, MotionEncoder,
};
pub use object::revision::{FixedRevisionSource, RevisionSource, SystemRevisionSource};
pub use object::{ExportStats, ExportedObject, ObjectExporter};
pub use options::ObjectExportOptions;
