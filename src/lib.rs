//! tagpack: a typed, MessagePack-compatible binary codec.
//!
//! Values are encoded against a codec (a type descriptor) that picks the
//! narrowest wire representation, and decoded by codecs that accept every
//! wider representation of the same value. Values without a declared codec go
//! through [`Any`](codec::Any), which maps tags to the dynamic [`Value`] model.
//!
//! # Architecture
//!
//! - **`buffer`**: big-endian write and read cursors
//! - **`wire`**: tag grammar and tag-driven copy/skip of encoded values
//! - **`codec`**: scalar, collection, struct/union, timestamp and dynamic codecs
//! - **`types`**: the dynamic [`Value`] model
//!
//! ```
//! use tagpack::codec::{Int, Str, Struct};
//! use tagpack::types::{Fields, Value};
//!
//! let person = Struct::builder()
//!     .field(1, "age", Int)
//!     .field(2, "name", Str)
//!     .build()?;
//!
//! let mut record = Fields::new();
//! record.insert("age".into(), Value::Int(42));
//! let bytes = tagpack::encode(&record, &person)?;
//! assert_eq!(bytes, [0x81, 0x01, 0x2a]);
//! assert_eq!(tagpack::decode(&bytes, &person)?, record);
//! # Ok::<(), tagpack::CodecError>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod error;
pub mod types;
pub mod wire;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use codec::{Codec, CollectionCodec, DynCodec};
pub use error::CodecError;
pub use types::Value;

use codec::Any;

/// Encodes `value` with `codec`.
pub fn encode<C: Codec + ?Sized>(value: &C::Value, codec: &C) -> Result<Vec<u8>, CodecError> {
    let mut buf = WriteBuffer::new();
    codec.encode(&mut buf, value)?;
    Ok(buf.into_vec())
}

/// Decodes one value from the start of `bytes`. Trailing bytes are ignored.
pub fn decode<C: Codec + ?Sized>(bytes: &[u8], codec: &C) -> Result<C::Value, CodecError> {
    let mut buf = ReadBuffer::new(bytes);
    codec.decode(&mut buf).inspect_err(|e| {
        tracing::debug!(error = %e, offset = buf.position(), "decode failed");
    })
}

/// Encodes a dynamic value, choosing the codec from its variant.
pub fn encode_any(value: &Value) -> Result<Vec<u8>, CodecError> {
    encode(value, &Any)
}

/// Decodes one dynamic value, choosing the codec from each tag.
pub fn decode_any(bytes: &[u8]) -> Result<Value, CodecError> {
    decode(bytes, &Any)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::codec::{Bool, Float, Int, Str, TypedArr, TypedMap, Uint, Union};
    use crate::types::{Key, Timestamp};

    #[test]
    fn minimal_width_integers() {
        assert_eq!(encode(&127, &Int).unwrap(), [0x7F]);
        assert_eq!(encode(&-7, &Int).unwrap(), [0xF9]);
        assert_eq!(encode(&-128, &Int).unwrap(), [0xD0, 0x80]);
        assert_eq!(encode(&-32, &Int).unwrap(), [0xD0, 0xE0]);
        assert_eq!(decode(&[0xE0], &Int).unwrap(), -32);
    }

    #[test]
    fn lenient_nil() {
        assert!(!decode(&[0xC0], &Bool).unwrap());
        assert_eq!(decode(&[0xC0], &Int).unwrap(), 0);
        assert_eq!(decode(&[0xC0], &Float).unwrap(), 0.0);
    }

    #[test]
    fn astral_codepoint() {
        let s = "\u{10348}".to_string();
        let data = encode(&s, &Str).unwrap();
        assert_eq!(data, [0xA4, 0xF0, 0x90, 0x8D, 0x88]);
        assert_eq!(decode(&data, &Str).unwrap(), s);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        assert_eq!(decode(&[0x05, 0xFF, 0xFF], &Uint).unwrap(), 5);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let err = decode(&[0xCD, 0x01], &Uint).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEof {
                needed: 2,
                remaining: 1
            }
        ));
    }

    #[test]
    fn any_round_trip() {
        let value = Value::Map(BTreeMap::from([
            (Key::from("when"), Value::Time(Timestamp::from_millis(1_506_431_655_016))),
            (Key::from("tags"), Value::from(vec!["a", "b"])),
            (Key::Int(0), Value::Float(-0.25)),
        ]));
        let data = encode_any(&value).unwrap();
        assert_eq!(decode_any(&data).unwrap(), value);
    }

    #[test]
    fn typed_and_dynamic_views_agree() {
        let codec = TypedMap::new(Str, TypedArr::new(Int));
        let map = BTreeMap::from([("xs".to_string(), vec![1, -1, 1000])]);
        let data = encode(&map, &codec).unwrap();

        let dynamic = decode_any(&data).unwrap();
        assert_eq!(
            dynamic,
            Value::Map(BTreeMap::from([(
                Key::from("xs"),
                Value::from(vec![1i64, -1, 1000])
            )]))
        );
        assert_eq!(encode_any(&dynamic).unwrap(), data);
    }

    #[test]
    fn dyn_codec_behind_arc() {
        let union: Arc<Union> = Arc::new(
            Union::builder(|v| if v.is_nil() { 0 } else { 1 })
                .branch(0, codec::Nil)
                .branch(1, Int)
                .build()
                .unwrap(),
        );
        let data = encode(&Value::Int(3), &union).unwrap();
        assert_eq!(data, [0x92, 0x01, 0x03]);
        assert_eq!(decode(&data, &union).unwrap(), Value::Int(3));
        assert_eq!(encode(&Value::Nil, &union).unwrap(), [0x92, 0x00, 0xC0]);
    }

    #[test]
    fn decode_error_kinds() {
        assert!(decode(&[0xA1, 0x61], &Int).unwrap_err().is_type_error());
        assert!(matches!(
            decode(&[0xFF], &Uint),
            Err(CodecError::Underflow(-1))
        ));
        assert!(matches!(
            decode(&[0xCF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], &Int),
            Err(CodecError::Overflow(_))
        ));
        assert!(matches!(
            decode(&[0xA2, 0xC3, 0x28], &Str),
            Err(CodecError::InvalidUtf8(_))
        ));
    }
}
