//! Growable write cursor.

use bytes::{BufMut, Bytes, BytesMut};

/// Initial capacity of a fresh buffer.
const DEFAULT_CAPACITY: usize = 64;

/// Appends encoded values to a growable byte store.
///
/// Growth is delegated to `BytesMut`, which reallocates and copies on demand
/// and never drops bytes that were already written.
#[derive(Debug, Clone)]
pub struct WriteBuffer {
    buf: BytesMut,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends raw bytes.
    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn put_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn put_i16(&mut self, v: i16) {
        self.buf.put_i16(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.put_f32(v);
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The written region, exactly `len()` bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..]
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Takes the written bytes without copying when the store is not shared.
    pub fn into_vec(self) -> Vec<u8> {
        Vec::from(self.buf)
    }

    /// Drops everything written after the first `len` bytes.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for WriteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
