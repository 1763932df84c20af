//! Scalar codecs: nil, booleans, integers, floats, byte blobs and strings.
//!
//! Encoders always pick the narrowest tag that fits. Decoders accept every
//! wider representation of the same value, and most treat a Nil tag as the
//! type's zero value.

use super::header::{decode_blob_header, encode_blob_header};
use super::{Codec, DynCodec};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::Value;
use crate::wire::tag::{self, Class};

/// Always writes the Nil tag, whatever the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nil;

#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

/// Signed integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

/// Unsigned integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uint;

/// Floats; always written as Float64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

/// Opaque byte blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bytes;

/// UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl Codec for Nil {
    type Value = ();

    fn encode(&self, buf: &mut WriteBuffer, _: &()) -> Result<(), CodecError> {
        buf.put_u8(tag::NIL);
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<(), CodecError> {
        match buf.get_u8()? {
            tag::NIL => Ok(()),
            m => Err(CodecError::tag(m, "nil")),
        }
    }
}

impl Codec for Bool {
    type Value = bool;

    fn encode(&self, buf: &mut WriteBuffer, value: &bool) -> Result<(), CodecError> {
        buf.put_u8(if *value { tag::TRUE } else { tag::FALSE });
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<bool, CodecError> {
        match buf.get_u8()? {
            tag::NIL | tag::FALSE => Ok(false),
            tag::TRUE => Ok(true),
            m => Err(CodecError::tag(m, "bool")),
        }
    }
}

impl Codec for Int {
    type Value = i64;

    fn encode(&self, buf: &mut WriteBuffer, value: &i64) -> Result<(), CodecError> {
        encode_int(buf, *value);
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<i64, CodecError> {
        let v = decode_integer(buf, "int")?;
        i64::try_from(v).map_err(|_| CodecError::Overflow("int"))
    }
}

impl Codec for Uint {
    type Value = u64;

    fn encode(&self, buf: &mut WriteBuffer, value: &u64) -> Result<(), CodecError> {
        encode_uint(buf, *value);
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<u64, CodecError> {
        let v = decode_integer(buf, "uint")?;
        // Negative values only come from signed tags, so they fit an i64.
        u64::try_from(v).map_err(|_| CodecError::Underflow(v as i64))
    }
}

impl Codec for Float {
    type Value = f64;

    fn encode(&self, buf: &mut WriteBuffer, value: &f64) -> Result<(), CodecError> {
        buf.put_u8(tag::FLOAT_64);
        buf.put_f64(*value);
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<f64, CodecError> {
        match buf.get_u8()? {
            tag::NIL => Ok(0.0),
            tag::FLOAT_32 => Ok(f64::from(buf.get_f32()?)),
            tag::FLOAT_64 => buf.get_f64(),
            m => Err(CodecError::tag(m, "float")),
        }
    }
}

impl Codec for Bytes {
    type Value = bytes::Bytes;

    fn encode(&self, buf: &mut WriteBuffer, value: &bytes::Bytes) -> Result<(), CodecError> {
        encode_blob_header(buf, tag::BIN_8, value.len())?;
        buf.put(value);
        Ok(())
    }

    /// Accepts the bin tiers and, since the two are wire-compatible, the str tiers.
    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<bytes::Bytes, CodecError> {
        let len = decode_blob_header(buf)?;
        Ok(bytes::Bytes::copy_from_slice(buf.get(len)?))
    }
}

impl Codec for Str {
    type Value = String;

    fn encode(&self, buf: &mut WriteBuffer, value: &String) -> Result<(), CodecError> {
        encode_str(buf, value)
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<String, CodecError> {
        let len = decode_blob_header(buf)?;
        let data = buf.get(len)?;
        Ok(String::from_utf8(data.to_vec())?)
    }
}

impl DynCodec for Nil {
    fn encode_value(&self, buf: &mut WriteBuffer, _: &Value) -> Result<(), CodecError> {
        self.encode(buf, &())
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(|()| Value::Nil)
    }
}

impl DynCodec for Bool {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_bool()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Bool)
    }
}

impl DynCodec for Int {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_int()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Int)
    }
}

impl DynCodec for Uint {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_uint()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Uint)
    }
}

impl DynCodec for Float {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, &value.to_float()?)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Float)
    }
}

impl DynCodec for Bytes {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        let data = match value {
            Value::Bytes(b) => &b[..],
            Value::Str(s) => s.as_bytes(),
            other => return Err(other.mismatch("bytes")),
        };
        encode_blob_header(buf, tag::BIN_8, data.len())?;
        buf.put(data);
        Ok(())
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Bytes)
    }
}

impl DynCodec for Str {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Str(s) => encode_str(buf, s),
            other => Err(other.mismatch("string")),
        }
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::Str)
    }
}

/// Encodes a signed integer using the smallest representation.
///
/// Negative fixint is only emitted for -31..=-1; -32 takes an Int8 tag even
/// though the tag range could hold it.
pub(crate) fn encode_int(buf: &mut WriteBuffer, value: i64) {
    if (0..=127).contains(&value) {
        buf.put_u8(tag::pos_fixint_tag(value as u8));
    } else if (-31..0).contains(&value) {
        buf.put_u8(tag::neg_fixint_tag(value as i8));
    } else if let Ok(v) = i8::try_from(value) {
        buf.put_u8(tag::INT_8);
        buf.put_i8(v);
    } else if let Ok(v) = i16::try_from(value) {
        buf.put_u8(tag::INT_16);
        buf.put_i16(v);
    } else if let Ok(v) = i32::try_from(value) {
        buf.put_u8(tag::INT_32);
        buf.put_i32(v);
    } else {
        buf.put_u8(tag::INT_64);
        buf.put_i64(value);
    }
}

/// Encodes an unsigned integer using the smallest representation.
pub(crate) fn encode_uint(buf: &mut WriteBuffer, value: u64) {
    if value <= 127 {
        buf.put_u8(tag::pos_fixint_tag(value as u8));
    } else if let Ok(v) = u8::try_from(value) {
        buf.put_u8(tag::UINT_8);
        buf.put_u8(v);
    } else if let Ok(v) = u16::try_from(value) {
        buf.put_u8(tag::UINT_16);
        buf.put_u16(v);
    } else if let Ok(v) = u32::try_from(value) {
        buf.put_u8(tag::UINT_32);
        buf.put_u32(v);
    } else {
        buf.put_u8(tag::UINT_64);
        buf.put_u64(value);
    }
}

/// Encodes text: fixstr below 32 bytes, otherwise the Str8/16/32 tiers.
pub(crate) fn encode_str(buf: &mut WriteBuffer, value: &str) -> Result<(), CodecError> {
    let utf8 = value.as_bytes();
    if utf8.len() < 32 {
        buf.put_u8(tag::fixstr_tag(utf8.len()));
    } else {
        encode_blob_header(buf, tag::STR_8, utf8.len())?;
    }
    buf.put(utf8);
    Ok(())
}

/// Reads any signed or unsigned integer tag. Nil reads as 0.
///
/// The result is widened to `i128` so both `i64::MIN` and `u64::MAX` survive
/// until the caller narrows it.
fn decode_integer(buf: &mut ReadBuffer<'_>, expected: &'static str) -> Result<i128, CodecError> {
    let m = buf.get_u8()?;
    let v = match Class::of(m) {
        Class::PosFixint(v) => i128::from(v),
        Class::NegFixint(v) => i128::from(v),
        Class::Nil => 0,
        Class::Int8 => i128::from(buf.get_i8()?),
        Class::Int16 => i128::from(buf.get_i16()?),
        Class::Int32 => i128::from(buf.get_i32()?),
        Class::Int64 => i128::from(buf.get_i64()?),
        Class::Uint8 => i128::from(buf.get_u8()?),
        Class::Uint16 => i128::from(buf.get_u16()?),
        Class::Uint32 => i128::from(buf.get_u32()?),
        Class::Uint64 => i128::from(buf.get_u64()?),
        _ => return Err(CodecError::tag(m, expected)),
    };
    Ok(v)
}
