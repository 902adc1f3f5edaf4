// xrobject-formats/src/reader.rs
//! Read-only walk over a chunk sequence
//!
//! Used to list what an export produced. It only splits bytes into
//! `(id, payload)` records; nothing is decoded back into scene data.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;
use xrobject_core::{Error, Result};

use crate::chunks::ObjectChunk;
use crate::writer::CHUNK_HEADER_SIZE;

/// One chunk borrowed from the underlying buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Raw chunk id
    pub id: u32,
    /// Offset of the chunk header in the walked buffer
    pub offset: usize,
    /// Payload bytes
    pub data: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Interpret the id as an object chunk
    pub fn kind(&self) -> ObjectChunk {
        ObjectChunk::from_u32(self.id)
    }

    /// Walk the payload as nested chunks
    pub fn children(&self) -> ChunkReader<'a> {
        ChunkReader::new(self.data)
    }
}

/// Iterator over the chunks of a buffer
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Collect every chunk, failing on the first truncated one
    pub fn collect_all(self) -> Result<Vec<Chunk<'a>>> {
        self.collect()
    }

    /// Find the first chunk with the given id
    pub fn find(self, id: u32) -> Result<Option<Chunk<'a>>> {
        for chunk in self {
            let chunk = chunk?;
            if chunk.id == id {
                return Ok(Some(chunk));
            }
        }
        Ok(None)
    }

    fn truncated(&mut self, needed: usize) -> Error {
        self.failed = true;
        warn!(offset = self.pos, needed, "Truncated chunk");
        Error::TruncatedChunk {
            offset: self.pos,
            needed,
            available: self.data.len() - self.pos,
        }
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }

        let remaining = self.data.len() - self.pos;
        if remaining < CHUNK_HEADER_SIZE {
            return Some(Err(self.truncated(CHUNK_HEADER_SIZE)));
        }

        let header = &self.data[self.pos..self.pos + CHUNK_HEADER_SIZE];
        let id = LittleEndian::read_u32(&header[..4]);
        let size = LittleEndian::read_u32(&header[4..]) as usize;

        if remaining - CHUNK_HEADER_SIZE < size {
            return Some(Err(self.truncated(CHUNK_HEADER_SIZE + size)));
        }

        let start = self.pos + CHUNK_HEADER_SIZE;
        let chunk = Chunk {
            id,
            offset: self.pos,
            data: &self.data[start..start + size],
        };
        self.pos = start + size;
        Some(Ok(chunk))
    }
}
