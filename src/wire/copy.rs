//! Tag-driven traversal of one encoded value.
//!
//! The payload size of every tag is known from the tag and its length fields
//! alone, so a value can be copied or skipped without decoding it. This also
//! covers extension types no codec knows about.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::wire::tag::Class;

/// Copies exactly one encoded value from `src` to `dst`, byte for byte.
///
/// On error `dst` is truncated back to its length before the call.
pub fn copy_value(src: &mut ReadBuffer<'_>, dst: &mut WriteBuffer) -> Result<(), CodecError> {
    let start = dst.len();
    let result = transfer(src, Some(&mut *dst));
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

/// Advances `src` past exactly one encoded value.
pub fn skip_value(src: &mut ReadBuffer<'_>) -> Result<(), CodecError> {
    transfer(src, None)
}

// Walks values in wire order with a counter of values still owed, so nesting
// depth costs no stack.
fn transfer(src: &mut ReadBuffer<'_>, mut dst: Option<&mut WriteBuffer>) -> Result<(), CodecError> {
    let mut pending: usize = 1;
    while pending > 0 {
        pending -= 1;
        let m = src.get_u8()?;
        if let Some(dst) = &mut dst {
            dst.put_u8(m);
        }

        // Number of nested values that follow the tag's own payload.
        let nested = match Class::of(m) {
            Class::PosFixint(_) | Class::NegFixint(_) | Class::Nil | Class::False | Class::True => 0,
            Class::Reserved => return Err(CodecError::tag(m, "value")),
            Class::Int8 | Class::Uint8 => forward(src, &mut dst, 1).map(|_| 0)?,
            Class::Int16 | Class::Uint16 => forward(src, &mut dst, 2).map(|_| 0)?,
            Class::Int32 | Class::Uint32 | Class::Float32 => forward(src, &mut dst, 4).map(|_| 0)?,
            Class::Int64 | Class::Uint64 | Class::Float64 => forward(src, &mut dst, 8).map(|_| 0)?,
            Class::FixStr(len) => forward(src, &mut dst, len).map(|_| 0)?,
            Class::Bin8 | Class::Str8 => blob(src, &mut dst, 1, 0)?,
            Class::Bin16 | Class::Str16 => blob(src, &mut dst, 2, 0)?,
            Class::Bin32 | Class::Str32 => blob(src, &mut dst, 4, 0)?,
            // Extension payloads carry a type id byte ahead of the data.
            Class::FixExt1 => forward(src, &mut dst, 2).map(|_| 0)?,
            Class::FixExt2 => forward(src, &mut dst, 3).map(|_| 0)?,
            Class::FixExt4 => forward(src, &mut dst, 5).map(|_| 0)?,
            Class::FixExt8 => forward(src, &mut dst, 9).map(|_| 0)?,
            Class::FixExt16 => forward(src, &mut dst, 17).map(|_| 0)?,
            Class::Ext8 => blob(src, &mut dst, 1, 1)?,
            Class::Ext16 => blob(src, &mut dst, 2, 1)?,
            Class::Ext32 => blob(src, &mut dst, 4, 1)?,
            Class::FixArray(len) => len,
            Class::Array16 => length(src, &mut dst, 2)?,
            Class::Array32 => length(src, &mut dst, 4)?,
            Class::FixMap(len) => len * 2,
            Class::Map16 => length(src, &mut dst, 2)? * 2,
            Class::Map32 => length(src, &mut dst, 4)?.saturating_mul(2),
        };
        // Saturation is harmless: input that large runs out of bytes first.
        pending = pending.saturating_add(nested);
    }
    Ok(())
}

/// Moves `len` raw bytes from `src` to `dst` and returns them.
fn forward<'a>(
    src: &mut ReadBuffer<'a>,
    dst: &mut Option<&mut WriteBuffer>,
    len: usize,
) -> Result<&'a [u8], CodecError> {
    let raw = src.get(len)?;
    if let Some(dst) = dst {
        dst.put(raw);
    }
    Ok(raw)
}

/// Forwards a big-endian length field of `width` bytes and returns its value.
fn length(
    src: &mut ReadBuffer<'_>,
    dst: &mut Option<&mut WriteBuffer>,
    width: usize,
) -> Result<usize, CodecError> {
    let raw = forward(src, dst, width)?;
    Ok(raw.iter().fold(0, |n, &b| (n << 8) | usize::from(b)))
}

// A length field followed by `extra + length` opaque bytes. Always returns 0.
fn blob(
    src: &mut ReadBuffer<'_>,
    dst: &mut Option<&mut WriteBuffer>,
    width: usize,
    extra: usize,
) -> Result<usize, CodecError> {
    let len = length(src, dst, width)?;
    forward(src, dst, extra + len)?;
    Ok(0)
}
