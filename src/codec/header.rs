//! Length headers shared by blobs and collections.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::wire::tag::{self, Class};

/// Writes a blob header: `base` for 8-bit lengths, `base + 1` for 16-bit,
/// `base + 2` for 32-bit.
pub(crate) fn encode_blob_header(
    buf: &mut WriteBuffer,
    base: u8,
    len: usize,
) -> Result<(), CodecError> {
    if let Ok(n) = u8::try_from(len) {
        buf.put_u8(base);
        buf.put_u8(n);
    } else if let Ok(n) = u16::try_from(len) {
        buf.put_u8(base + 1);
        buf.put_u16(n);
    } else if let Ok(n) = u32::try_from(len) {
        buf.put_u8(base + 2);
        buf.put_u32(n);
    } else {
        return Err(CodecError::LengthLimit(len));
    }
    Ok(())
}

/// Reads the length of a bin or str blob of any tier. Nil reads as empty.
pub(crate) fn decode_blob_header(buf: &mut ReadBuffer<'_>) -> Result<usize, CodecError> {
    let m = buf.get_u8()?;
    match Class::of(m) {
        Class::Nil => Ok(0),
        Class::FixStr(len) => Ok(len),
        Class::Bin8 | Class::Str8 => Ok(usize::from(buf.get_u8()?)),
        Class::Bin16 | Class::Str16 => Ok(usize::from(buf.get_u16()?)),
        Class::Bin32 | Class::Str32 => Ok(buf.get_u32()? as usize),
        _ => Err(CodecError::tag(m, "bytes or string")),
    }
}

pub(crate) fn encode_array_header(buf: &mut WriteBuffer, len: usize) -> Result<(), CodecError> {
    if len < 16 {
        buf.put_u8(tag::fixarray_tag(len));
        Ok(())
    } else {
        encode_collection_header(buf, tag::ARRAY_16, len)
    }
}

pub(crate) fn decode_array_header(
    buf: &mut ReadBuffer<'_>,
    expect: Option<usize>,
) -> Result<usize, CodecError> {
    let m = buf.get_u8()?;
    let len = if tag::is_fixarray(m) {
        tag::read_fixarray(m)
    } else {
        decode_collection_header(buf, m, tag::ARRAY_16, "array")?
    };
    check_expected(len, expect)
}

pub(crate) fn encode_map_header(buf: &mut WriteBuffer, len: usize) -> Result<(), CodecError> {
    if len < 16 {
        buf.put_u8(tag::fixmap_tag(len));
        Ok(())
    } else {
        encode_collection_header(buf, tag::MAP_16, len)
    }
}

pub(crate) fn decode_map_header(
    buf: &mut ReadBuffer<'_>,
    expect: Option<usize>,
) -> Result<usize, CodecError> {
    let m = buf.get_u8()?;
    let len = if tag::is_fixmap(m) {
        tag::read_fixmap(m)
    } else {
        decode_collection_header(buf, m, tag::MAP_16, "map")?
    };
    check_expected(len, expect)
}

// `base` is the 16-bit tier; the 32-bit tier is `base + 1`.
fn encode_collection_header(buf: &mut WriteBuffer, base: u8, len: usize) -> Result<(), CodecError> {
    if let Ok(n) = u16::try_from(len) {
        buf.put_u8(base);
        buf.put_u16(n);
    } else if let Ok(n) = u32::try_from(len) {
        buf.put_u8(base + 1);
        buf.put_u32(n);
    } else {
        return Err(CodecError::LengthLimit(len));
    }
    Ok(())
}

fn decode_collection_header(
    buf: &mut ReadBuffer<'_>,
    m: u8,
    base: u8,
    expected: &'static str,
) -> Result<usize, CodecError> {
    if m == tag::NIL {
        Ok(0)
    } else if m == base {
        Ok(usize::from(buf.get_u16()?))
    } else if m == base + 1 {
        Ok(buf.get_u32()? as usize)
    } else {
        Err(CodecError::tag(m, expected))
    }
}

fn check_expected(len: usize, expect: Option<usize>) -> Result<usize, CodecError> {
    match expect {
        Some(expected) if expected != len => Err(CodecError::HeaderMismatch {
            expected,
            found: len,
        }),
        _ => Ok(len),
    }
}
