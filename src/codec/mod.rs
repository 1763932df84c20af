//! Type descriptors: the codecs that encode and decode one kind of value.
//!
//! A codec is an immutable, stateless value. Build it once and share it across
//! any number of concurrent `encode`/`decode` calls.

pub mod any;
pub mod collection;
pub mod composite;
mod header;
pub mod scalar;
pub mod time;

use std::sync::Arc;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::Value;

pub use any::{Any, AnyKey};
pub use collection::{Arr, Map, TypedArr, TypedMap, ARR, MAP};
pub use composite::{Struct, StructBuilder, Union, UnionBuilder};
pub use scalar::{Bool, Bytes, Float, Int, Nil, Str, Uint};
pub use time::{CompactTime, Time};

/// Encodes and decodes values of one type.
pub trait Codec: Send + Sync {
    type Value;

    /// Appends the encoded value to `buf`.
    fn encode(&self, buf: &mut WriteBuffer, value: &Self::Value) -> Result<(), CodecError>;

    /// Reads exactly one encoded value from `buf`.
    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Self::Value, CodecError>;
}

/// A codec for arrays or maps, which also exposes the length header.
pub trait CollectionCodec: Codec {
    fn encode_header(&self, buf: &mut WriteBuffer, len: usize) -> Result<(), CodecError>;

    /// Reads a length header. With `expect`, a different length is an error.
    fn decode_header(
        &self,
        buf: &mut ReadBuffer<'_>,
        expect: Option<usize>,
    ) -> Result<usize, CodecError>;
}

/// Object-safe view of a codec over dynamic [`Value`]s.
///
/// Struct fields and union branches are stored as `Box<dyn DynCodec>`. Every
/// codec in this crate implements it, encoding straight from the borrowed
/// `Value` so nested records are never copied on the way out.
pub trait DynCodec: Send + Sync {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError>;

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError>;
}

impl<C: DynCodec + ?Sized> DynCodec for Arc<C> {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        (**self).encode_value(buf, value)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        (**self).decode_value(buf)
    }
}

impl<C: Codec + ?Sized> Codec for Arc<C> {
    type Value = C::Value;

    fn encode(&self, buf: &mut WriteBuffer, value: &Self::Value) -> Result<(), CodecError> {
        (**self).encode(buf, value)
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Self::Value, CodecError> {
        (**self).decode(buf)
    }
}
