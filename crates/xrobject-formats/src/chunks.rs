// xrobject-formats/src/chunks.rs
//! Object chunk ids

use serde::{Deserialize, Serialize};

/// Object format version written to the VERSION chunk
pub const OBJECT_VERSION: u16 = 0x0010;

/// Chunk types found in an `.object` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectChunk {
    /// Whole-object wrapper used by `.object` files
    Main,
    /// Format version
    Version,
    /// Object flags
    Flags,
    /// Surfaces (oldest layout)
    Surfaces,
    /// Surfaces (second layout)
    Surfaces1,
    /// Surfaces with texture, vmap and flags
    Surfaces2,
    /// Nested mesh list
    Meshes,
    /// Library version
    LibVersion,
    /// User data string
    UserData,
    /// Bones (oldest layout)
    Bones,
    /// Embedded motions
    Motions,
    /// Shader list
    Shaders,
    /// Partitions (oldest layout)
    Partitions0,
    /// Root translation and rotation
    Transform,
    /// Nested bone list
    Bones1,
    /// Owner and modifier stamps
    Revision,
    /// Bone partitions
    Partitions1,
    /// Motion references as one comma-joined string
    MotionRefs,
    /// LOD object reference
    LodRef,
    /// Motion references as a counted list
    SMotions3,
    /// Unknown chunk type
    Unknown(u32),
}

impl ObjectChunk {
    /// Convert from raw u32 chunk id
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x7777 => ObjectChunk::Main,
            0x0900 => ObjectChunk::Version,
            0x0903 => ObjectChunk::Flags,
            0x0905 => ObjectChunk::Surfaces,
            0x0906 => ObjectChunk::Surfaces1,
            0x0907 => ObjectChunk::Surfaces2,
            0x0910 => ObjectChunk::Meshes,
            0x0911 => ObjectChunk::LibVersion,
            0x0912 => ObjectChunk::UserData,
            0x0913 => ObjectChunk::Bones,
            0x0916 => ObjectChunk::Motions,
            0x0918 => ObjectChunk::Shaders,
            0x0919 => ObjectChunk::Partitions0,
            0x0920 => ObjectChunk::Transform,
            0x0921 => ObjectChunk::Bones1,
            0x0922 => ObjectChunk::Revision,
            0x0923 => ObjectChunk::Partitions1,
            0x0924 => ObjectChunk::MotionRefs,
            0x0925 => ObjectChunk::LodRef,
            0x0926 => ObjectChunk::SMotions3,
            other => ObjectChunk::Unknown(other),
        }
    }

    /// Convert to raw u32 chunk id
    pub fn id(&self) -> u32 {
        match self {
            ObjectChunk::Main => 0x7777,
            ObjectChunk::Version => 0x0900,
            ObjectChunk::Flags => 0x0903,
            ObjectChunk::Surfaces => 0x0905,
            ObjectChunk::Surfaces1 => 0x0906,
            ObjectChunk::Surfaces2 => 0x0907,
            ObjectChunk::Meshes => 0x0910,
            ObjectChunk::LibVersion => 0x0911,
            ObjectChunk::UserData => 0x0912,
            ObjectChunk::Bones => 0x0913,
            ObjectChunk::Motions => 0x0916,
            ObjectChunk::Shaders => 0x0918,
            ObjectChunk::Partitions0 => 0x0919,
            ObjectChunk::Transform => 0x0920,
            ObjectChunk::Bones1 => 0x0921,
            ObjectChunk::Revision => 0x0922,
            ObjectChunk::Partitions1 => 0x0923,
            ObjectChunk::MotionRefs => 0x0924,
            ObjectChunk::LodRef => 0x0925,
            ObjectChunk::SMotions3 => 0x0926,
            ObjectChunk::Unknown(v) => *v,
        }
    }

    /// Human-readable name for listings
    pub fn name(&self) -> String {
        match self {
            ObjectChunk::Unknown(v) => format!("UNKNOWN_{v:04X}"),
            known => format!("{known:?}").to_uppercase(),
        }
    }

    /// Check if this chunk holds nested chunks instead of packed fields
    pub fn is_container(&self) -> bool {
        matches!(self, ObjectChunk::Main | ObjectChunk::Meshes | ObjectChunk::Bones1)
    }
}

impl From<ObjectChunk> for u32 {
    fn from(chunk: ObjectChunk) -> Self {
        chunk.id()
    }
}
