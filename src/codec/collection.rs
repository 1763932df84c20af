//! Generic array and map codecs.

use std::collections::BTreeMap;

use super::any::{Any, AnyKey};
use super::header::{decode_array_header, decode_map_header, encode_array_header, encode_map_header};
use super::{Codec, CollectionCodec, DynCodec};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::{FromValue, Key, Value};

/// Array of values that all use the element codec `C`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedArr<C> {
    elem: C,
}

/// Map from keys encoded with `K` to values encoded with `V`.
///
/// Keys should be numbers or strings; `K::Value: Ord` keeps decoded maps
/// comparable by entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedMap<K, V> {
    key: K,
    value: V,
}

/// Array of dynamic values.
pub type Arr = TypedArr<Any>;

/// Map of dynamic keys to dynamic values.
pub type Map = TypedMap<AnyKey, Any>;

pub const ARR: Arr = TypedArr::new(Any);
pub const MAP: Map = TypedMap::new(AnyKey, Any);

impl<C> TypedArr<C> {
    pub const fn new(elem: C) -> Self {
        Self { elem }
    }
}

impl<K, V> TypedMap<K, V> {
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<C: Codec> Codec for TypedArr<C> {
    type Value = Vec<C::Value>;

    fn encode(&self, buf: &mut WriteBuffer, items: &Vec<C::Value>) -> Result<(), CodecError> {
        self.encode_header(buf, items.len())?;
        for item in items {
            self.elem.encode(buf, item)?;
        }
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Vec<C::Value>, CodecError> {
        let len = self.decode_header(buf, None)?;
        buf.nested(|buf| decode_items(buf, len, |buf| self.elem.decode(buf)))
    }
}

impl<C: Codec> CollectionCodec for TypedArr<C> {
    fn encode_header(&self, buf: &mut WriteBuffer, len: usize) -> Result<(), CodecError> {
        encode_array_header(buf, len)
    }

    fn decode_header(
        &self,
        buf: &mut ReadBuffer<'_>,
        expect: Option<usize>,
    ) -> Result<usize, CodecError> {
        decode_array_header(buf, expect)
    }
}

impl<K, V> Codec for TypedMap<K, V>
where
    K: Codec,
    K::Value: Ord,
    V: Codec,
{
    type Value = BTreeMap<K::Value, V::Value>;

    fn encode(&self, buf: &mut WriteBuffer, map: &Self::Value) -> Result<(), CodecError> {
        self.encode_header(buf, map.len())?;
        for (k, v) in map {
            self.key.encode(buf, k)?;
            self.value.encode(buf, v)?;
        }
        Ok(())
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Self::Value, CodecError> {
        let len = self.decode_header(buf, None)?;
        buf.nested(|buf| {
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let k = self.key.decode(buf)?;
                let v = self.value.decode(buf)?;
                map.insert(k, v);
            }
            Ok(map)
        })
    }
}

impl<K, V> CollectionCodec for TypedMap<K, V>
where
    K: Codec,
    K::Value: Ord,
    V: Codec,
{
    fn encode_header(&self, buf: &mut WriteBuffer, len: usize) -> Result<(), CodecError> {
        encode_map_header(buf, len)
    }

    fn decode_header(
        &self,
        buf: &mut ReadBuffer<'_>,
        expect: Option<usize>,
    ) -> Result<usize, CodecError> {
        decode_map_header(buf, expect)
    }
}

impl<C: DynCodec> DynCodec for TypedArr<C> {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        let Value::Array(items) = value else {
            return Err(value.mismatch("array"));
        };
        encode_array_header(buf, items.len())?;
        for item in items {
            self.elem.encode_value(buf, item)?;
        }
        Ok(())
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        let len = decode_array_header(buf, None)?;
        buf.nested(|buf| decode_items(buf, len, |buf| self.elem.decode_value(buf)))
            .map(Value::Array)
    }
}

impl<K: DynCodec, V: DynCodec> DynCodec for TypedMap<K, V> {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        let Value::Map(map) = value else {
            return Err(value.mismatch("map"));
        };
        encode_map_header(buf, map.len())?;
        for (k, v) in map {
            self.key.encode_value(buf, &Value::from(k.clone()))?;
            self.value.encode_value(buf, v)?;
        }
        Ok(())
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        let len = decode_map_header(buf, None)?;
        buf.nested(|buf| {
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let k = Key::from_value(self.key.decode_value(buf)?)?;
                let v = self.value.decode_value(buf)?;
                map.insert(k, v);
            }
            Ok(Value::Map(map))
        })
    }
}

fn decode_items<T>(
    buf: &mut ReadBuffer<'_>,
    len: usize,
    mut decode: impl FnMut(&mut ReadBuffer<'_>) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    // Every element takes at least one byte, which bounds the allocation.
    let mut items = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        items.push(decode(buf)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Int, Str};
    use crate::types::{Key, Value};
    use crate::wire::tag;

    fn enc<C: Codec>(codec: &C, value: &C::Value) -> Vec<u8> {
        let mut buf = WriteBuffer::new();
        codec.encode(&mut buf, value).expect("encode failed");
        buf.into_vec()
    }

    #[test]
    fn encode_fixarray() {
        let data = enc(&TypedArr::new(Int), &vec![13; 7]);
        let mut expected = vec![0x97];
        expected.extend(std::iter::repeat_n(0x0D, 7));
        assert_eq!(data, expected);
    }

    #[test]
    fn array_tier_boundaries() {
        let codec = TypedArr::new(Int);
        assert_eq!(enc(&codec, &vec![1; 15])[0], 0x9F);
        assert_eq!(&enc(&codec, &vec![1; 16])[..3], &[tag::ARRAY_16, 0x00, 0x10]);

        let data = enc(&codec, &vec![13; 65535]);
        assert_eq!(&data[..3], &[tag::ARRAY_16, 0xFF, 0xFF]);
        assert_eq!(data.len(), 3 + 65535);

        let data = enc(&codec, &vec![13; 65536]);
        assert_eq!(&data[..5], &[tag::ARRAY_32, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(codec.decode(&mut ReadBuffer::new(&data)).unwrap().len(), 65536);
    }

    #[test]
    fn round_trip_typed_array() {
        let codec = TypedArr::new(Str);
        let items = vec!["a".to_string(), "bc".to_string(), String::new()];
        let data = enc(&codec, &items);
        assert_eq!(codec.decode(&mut ReadBuffer::new(&data)).unwrap(), items);
    }

    #[test]
    fn decode_array_of_any() {
        let data = [tag::ARRAY_16, 0x00, 0x02, 0x07, 0xA1, 0x61];
        let items = ARR.decode(&mut ReadBuffer::new(&data)).unwrap();
        assert_eq!(items, vec![Value::Int(7), Value::from("a")]);
    }

    #[test]
    fn encode_map_of_any() {
        let map = BTreeMap::from([
            (Key::from("a"), Value::Int(7)),
            (Key::from("b"), Value::Int(13)),
        ]);
        assert_eq!(
            enc(&MAP, &map),
            vec![0x82, 0xA1, 0x61, 0x07, 0xA1, 0x62, 0x0D]
        );
    }

    #[test]
    fn decode_map_any_tier() {
        let data = [tag::MAP_32, 0x00, 0x00, 0x00, 0x01, 0xA2, 0x31, 0x30, 0xA1, 0x32];
        let map = MAP.decode(&mut ReadBuffer::new(&data)).unwrap();
        assert_eq!(map, BTreeMap::from([(Key::from("10"), Value::from("2"))]));

        let data = [tag::MAP_16, 0x00, 0x01, 0xA2, 0xC3, 0xA4, 0x0B];
        let map = MAP.decode(&mut ReadBuffer::new(&data)).unwrap();
        assert_eq!(map.get(&Key::from("ä")), Some(&Value::Int(11)));
    }

    #[test]
    fn round_trip_typed_map() {
        let codec = TypedMap::new(Int, TypedArr::new(Str));
        let map = BTreeMap::from([
            (-40, vec!["x".to_string()]),
            (3, vec![]),
            (70_000, vec!["y".to_string(), "z".to_string()]),
        ]);
        let data = enc(&codec, &map);
        assert_eq!(data[0], 0x83);
        assert_eq!(codec.decode(&mut ReadBuffer::new(&data)).unwrap(), map);
    }

    #[test]
    fn map_decoded_as_array_is_type_error() {
        let data = [0x81, 0x01, 0x02];
        let err = TypedArr::new(Int)
            .decode(&mut ReadBuffer::new(&data))
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn nil_decodes_as_empty_collection() {
        assert!(ARR.decode(&mut ReadBuffer::new(&[tag::NIL])).unwrap().is_empty());
        assert!(MAP.decode(&mut ReadBuffer::new(&[tag::NIL])).unwrap().is_empty());
    }

    #[test]
    fn dynamic_view_matches_typed_encoding() {
        let codec = TypedMap::new(Int, TypedArr::new(Str));
        let typed = BTreeMap::from([(2, vec!["a".to_string()])]);
        let dynamic = Value::Map(BTreeMap::from([(
            Key::Int(2),
            Value::from(vec!["a"]),
        )]));

        let mut buf = WriteBuffer::new();
        codec.encode_value(&mut buf, &dynamic).unwrap();
        assert_eq!(buf.as_slice(), &enc(&codec, &typed)[..]);
        assert_eq!(
            codec.decode_value(&mut ReadBuffer::new(buf.as_slice())).unwrap(),
            dynamic
        );

        let err = codec
            .encode_value(&mut WriteBuffer::new(), &Value::Int(1))
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn nesting_beyond_limit_is_an_error() {
        let codec = TypedArr::new(TypedArr::new(TypedArr::new(Int)));
        let data = [0x91, 0x91, 0x91, 0x01];
        assert!(codec.decode(&mut ReadBuffer::new(&data)).is_ok());

        let err = codec
            .decode(&mut ReadBuffer::with_depth_limit(&data, 2))
            .unwrap_err();
        assert!(matches!(err, CodecError::DepthLimit(2)));
    }
}
