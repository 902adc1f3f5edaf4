// xrobject-formats/src/writer.rs
//! Packed and chunked byte buffer builders
//!
//! Both writers are append-only and infallible. Everything is little-endian;
//! strings are raw bytes followed by a single NUL terminator.

use byteorder::{ByteOrder, LittleEndian};

/// Size of a chunk header: `u32 id` + `u32 length`
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Flat field writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedWriter {
    data: Vec<u8>,
}

impl PackedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn put_i8(&mut self, value: i8) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.put_bytes(&buf)
    }

    pub fn put_i16(&mut self, value: i16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.put_bytes(&buf)
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.put_bytes(&buf)
    }

    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.put_bytes(&buf)
    }

    pub fn put_f32(&mut self, value: f32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        self.put_bytes(&buf)
    }

    /// Write a float triple (vector or Euler angles)
    pub fn put_f32s(&mut self, values: [f32; 3]) -> &mut Self {
        let mut buf = [0u8; 12];
        LittleEndian::write_f32_into(&values, &mut buf);
        self.put_bytes(&buf)
    }

    /// Write string bytes followed by one NUL, no length prefix
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self
    }

    /// Write raw bytes as-is
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for PackedWriter {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Chunk sequence writer
///
/// Each [`put`](Self::put) appends `u32 id | u32 length | payload`. A payload
/// may be another `ChunkedWriter`, which nests its serialized bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedWriter {
    data: Vec<u8>,
}

impl ChunkedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk
    ///
    /// The length field is a `u32`, so payloads are limited to 4 GiB.
    /// Larger payloads panic in debug builds and are clamped otherwise.
    pub fn put(&mut self, id: u32, payload: impl AsRef<[u8]>) -> &mut Self {
        let payload = payload.as_ref();
        let mut header = [0u8; CHUNK_HEADER_SIZE];
        LittleEndian::write_u32(&mut header[..4], id);
        LittleEndian::write_u32(&mut header[4..], payload_len(payload.len()));

        self.data.reserve(CHUNK_HEADER_SIZE + payload.len());
        self.data.extend_from_slice(&header);
        self.data.extend_from_slice(payload);
        self
    }

    /// Append `writers` as chunks with ids `0, 1, 2, ...`
    pub fn put_indexed<I, P>(&mut self, writers: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        for (idx, writer) in writers.into_iter().enumerate() {
            self.put(idx as u32, writer);
        }
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn payload_len(len: usize) -> u32 {
    debug_assert!(len <= u32::MAX as usize, "chunk payload of {len} bytes exceeds u32 length field");
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl AsRef<[u8]> for ChunkedWriter {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
