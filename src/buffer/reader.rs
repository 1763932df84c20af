//! Sequential read cursor over a borrowed byte slice.

use bytes::Buf;

use crate::error::CodecError;

/// Default bound on how deeply arrays, maps, structs and unions may nest.
pub const DEFAULT_DEPTH_LIMIT: usize = 128;

/// Reads encoded values front to back.
///
/// Every getter checks the remaining length first, so truncated input surfaces
/// as [`CodecError::UnexpectedEof`] rather than a panic. Container codecs
/// also book their nesting depth here, so hostile input cannot recurse
/// without bound.
#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    buf: &'a [u8],
    consumed: usize,
    depth: usize,
    depth_limit: usize,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_depth_limit(buf, DEFAULT_DEPTH_LIMIT)
    }

    /// Creates a cursor that allows at most `limit` nested containers.
    pub fn with_depth_limit(buf: &'a [u8], limit: usize) -> Self {
        Self {
            buf,
            consumed: 0,
            depth: 0,
            depth_limit: limit,
        }
    }

    /// Returns the next byte without advancing.
    pub fn peek(&self) -> Result<u8, CodecError> {
        self.ensure_remaining(1)?;
        Ok(self.buf[0])
    }

    /// Returns the next `len` bytes and advances past them.
    pub fn get(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        self.ensure_remaining(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        self.consumed += len;
        Ok(head)
    }

    pub fn get_i8(&mut self) -> Result<i8, CodecError> {
        self.advance(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn get_i16(&mut self) -> Result<i16, CodecError> {
        self.advance(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn get_i32(&mut self) -> Result<i32, CodecError> {
        self.advance(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn get_i64(&mut self) -> Result<i64, CodecError> {
        self.advance(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        self.advance(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        self.advance(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        self.advance(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        self.advance(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn get_f32(&mut self) -> Result<f32, CodecError> {
        self.advance(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn get_f64(&mut self) -> Result<f64, CodecError> {
        self.advance(8)?;
        Ok(self.buf.get_f64())
    }

    /// Bytes consumed since the cursor was created.
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Runs `f` one container level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        if self.depth >= self.depth_limit {
            return Err(CodecError::DepthLimit(self.depth_limit));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn ensure_remaining(&self, needed: usize) -> Result<(), CodecError> {
        if self.buf.len() < needed {
            Err(CodecError::UnexpectedEof {
                needed,
                remaining: self.buf.len(),
            })
        } else {
            Ok(())
        }
    }

    // Checks and books `width` bytes; the caller then reads them via `Buf`.
    fn advance(&mut self, width: usize) -> Result<(), CodecError> {
        self.ensure_remaining(width)?;
        self.consumed += width;
        Ok(())
    }
}
