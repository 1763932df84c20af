//! Dynamic codec: picks a concrete codec from the value's variant when
//! encoding and from the next tag when decoding.

use super::collection::{ARR, MAP};
use super::scalar::{encode_int, encode_str, encode_uint};
use super::time::Time;
use super::{Bool, Bytes, Codec, DynCodec, Float, Int, Nil, Str, Uint};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::{Key, Value};
use crate::wire::tag::Class;

/// 2^64 and -2^63 as floats, the bounds of integral floats written as integers.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;

/// Codec for any [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Any;

/// Codec for map keys: numbers, strings and byte strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyKey;

impl Codec for Any {
    type Value = Value;

    fn encode(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Nil => Nil.encode(buf, &()),
            Value::Bool(b) => Bool.encode(buf, b),
            Value::Int(i) => {
                encode_integer(buf, *i);
                Ok(())
            }
            Value::Uint(u) => Uint.encode(buf, u),
            Value::Float(f) => encode_number(buf, *f),
            Value::Bytes(b) => Bytes.encode(buf, b),
            Value::Str(s) => encode_str(buf, s),
            Value::Array(items) => ARR.encode(buf, items),
            Value::Map(map) => MAP.encode(buf, map),
            Value::Time(t) => Time.encode(buf, t),
        }
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        let m = buf.peek()?;
        match Class::of(m) {
            Class::Nil => Nil.decode(buf).map(|()| Value::Nil),
            Class::False | Class::True => Bool.decode(buf).map(Value::Bool),
            Class::PosFixint(_)
            | Class::NegFixint(_)
            | Class::Int8
            | Class::Int16
            | Class::Int32
            | Class::Int64 => Int.decode(buf).map(Value::Int),
            Class::Uint8 | Class::Uint16 | Class::Uint32 | Class::Uint64 => {
                Uint.decode(buf).map(Value::Uint)
            }
            Class::Float32 | Class::Float64 => Float.decode(buf).map(Value::Float),
            Class::Bin8 | Class::Bin16 | Class::Bin32 => Bytes.decode(buf).map(Value::Bytes),
            Class::FixStr(_) | Class::Str8 | Class::Str16 | Class::Str32 => {
                Str.decode(buf).map(Value::Str)
            }
            Class::FixArray(_) | Class::Array16 | Class::Array32 => {
                ARR.decode(buf).map(Value::Array)
            }
            Class::FixMap(_) | Class::Map16 | Class::Map32 => MAP.decode(buf).map(Value::Map),
            Class::FixExt4 | Class::FixExt8 | Class::Ext8 => Time.decode(buf).map(Value::Time),
            Class::Reserved
            | Class::Ext16
            | Class::Ext32
            | Class::FixExt1
            | Class::FixExt2
            | Class::FixExt16 => Err(CodecError::tag(m, "any")),
        }
    }
}

impl Codec for AnyKey {
    type Value = Key;

    fn encode(&self, buf: &mut WriteBuffer, key: &Key) -> Result<(), CodecError> {
        match key {
            Key::Int(i) => {
                encode_integer(buf, *i);
                Ok(())
            }
            Key::Uint(u) => Uint.encode(buf, u),
            // Float keys stay floats so they read back as the same key.
            Key::Float(f) => Float.encode(buf, f),
            Key::Str(s) => encode_str(buf, s),
            Key::Bytes(b) => Bytes.encode(buf, b),
        }
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Key, CodecError> {
        let m = buf.peek()?;
        match Class::of(m) {
            Class::PosFixint(_)
            | Class::NegFixint(_)
            | Class::Int8
            | Class::Int16
            | Class::Int32
            | Class::Int64 => Int.decode(buf).map(Key::Int),
            Class::Uint8 | Class::Uint16 | Class::Uint32 | Class::Uint64 => {
                Uint.decode(buf).map(Key::from)
            }
            Class::Float32 | Class::Float64 => Float.decode(buf).map(Key::Float),
            Class::FixStr(_) | Class::Str8 | Class::Str16 | Class::Str32 => {
                Str.decode(buf).map(Key::Str)
            }
            Class::Bin8 | Class::Bin16 | Class::Bin32 => Bytes.decode(buf).map(Key::Bytes),
            _ => Err(CodecError::tag(m, "map key")),
        }
    }
}

impl DynCodec for Any {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, value)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf)
    }
}

impl DynCodec for AnyKey {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Int(i) => {
                encode_integer(buf, *i);
                Ok(())
            }
            Value::Uint(u) => Uint.encode(buf, u),
            Value::Float(f) => Float.encode(buf, f),
            Value::Str(s) => encode_str(buf, s),
            Value::Bytes(b) => Bytes.encode(buf, b),
            other => Err(other.mismatch("map key")),
        }
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::from)
    }
}

// Non-negative integers take the unsigned tiers.
fn encode_integer(buf: &mut WriteBuffer, i: i64) {
    match u64::try_from(i) {
        Ok(u) => encode_uint(buf, u),
        Err(_) => encode_int(buf, i),
    }
}

/// Integral finite floats are written as integers when they fit.
fn encode_number(buf: &mut WriteBuffer, f: f64) -> Result<(), CodecError> {
    if f.is_finite() && f.fract() == 0.0 {
        if (0.0..U64_LIMIT).contains(&f) {
            encode_uint(buf, f as u64);
            return Ok(());
        }
        if (I64_MIN..0.0).contains(&f) {
            encode_int(buf, f as i64);
            return Ok(());
        }
    }
    Float.encode(buf, &f)
}
