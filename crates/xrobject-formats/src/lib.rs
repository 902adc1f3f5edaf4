//! xrobject-formats
//!
//! Low-level building blocks of the X-Ray object format.
//!
//! # Layout
//!
//! | Piece | Description |
//! |-------|-------------|
//! | [`PackedWriter`]  | flat little-endian field writer |
//! | [`ChunkedWriter`] | sequence of `id | length | payload` records |
//! | [`ChunkReader`]   | read-only walk over a chunk sequence |
//! | [`ObjectChunk`]   | chunk ids of the `.object` body |
//!
//! # Example
//!
//! ```rust
//! use xrobject_formats::{ChunkedWriter, ObjectChunk, PackedWriter};
//!
//! let mut body = ChunkedWriter::new();
//! let mut version = PackedWriter::new();
//! version.put_u16(0x10);
//! body.put(ObjectChunk::Version.id(), version);
//!
//! assert_eq!(body.len(), 8 + 2);
//! ```

pub mod chunks;
pub mod reader;
pub mod writer;

pub use chunks::ObjectChunk;
pub use reader::{Chunk, ChunkReader};
pub use writer::{ChunkedWriter, PackedWriter};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
