//! Ordinal-keyed structs and discriminated unions.
//!
//! On the wire a struct is a map from integer ordinals to field values, and a
//! union is a two-element array `[ordinal, value]`. Neither carries anything
//! that distinguishes it from a plain map or array.

use std::collections::BTreeMap;
use std::fmt;

use super::header::{decode_array_header, decode_map_header, encode_array_header, encode_map_header};
use super::scalar::encode_int;
use super::{Codec, DynCodec, Int};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::CodecError;
use crate::types::{Fields, Key, Value};
use crate::wire::copy::skip_value;

struct Field {
    ordinal: i64,
    name: String,
    codec: Box<dyn DynCodec>,
}

/// Record codec with a fixed table of `ordinal -> (name, codec)` fields.
///
/// Encoding writes the fields present in the record, in declaration order.
/// Decoding skips ordinals it does not know, so older readers accept data
/// written with newer field tables.
pub struct Struct {
    fields: Vec<Field>,
    by_ordinal: BTreeMap<i64, usize>,
}

/// Builder for [`Struct`].
#[derive(Default)]
pub struct StructBuilder {
    fields: Vec<Field>,
}

impl Struct {
    pub fn builder() -> StructBuilder {
        StructBuilder::default()
    }

    /// Declared `(ordinal, name)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (i64, &str)> {
        self.fields.iter().map(|f| (f.ordinal, f.name.as_str()))
    }

    fn encode_with<'v>(
        &self,
        buf: &mut WriteBuffer,
        lookup: impl Fn(&str) -> Option<&'v Value>,
    ) -> Result<(), CodecError> {
        let present = self.fields.iter().filter(|f| lookup(f.name.as_str()).is_some()).count();
        encode_map_header(buf, present)?;
        for field in &self.fields {
            if let Some(value) = lookup(field.name.as_str()) {
                encode_int(buf, field.ordinal);
                field.codec.encode_value(buf, value)?;
            }
        }
        Ok(())
    }
}

impl StructBuilder {
    /// Declares a field.
    pub fn field(
        mut self,
        ordinal: i64,
        name: impl Into<String>,
        codec: impl DynCodec + 'static,
    ) -> Self {
        self.fields.push(Field {
            ordinal,
            name: name.into(),
            codec: Box::new(codec),
        });
        self
    }

    /// Fails with [`CodecError::DuplicateOrdinal`] if two fields share an ordinal.
    pub fn build(self) -> Result<Struct, CodecError> {
        let mut by_ordinal = BTreeMap::new();
        for (i, field) in self.fields.iter().enumerate() {
            if by_ordinal.insert(field.ordinal, i).is_some() {
                return Err(CodecError::DuplicateOrdinal(field.ordinal));
            }
        }
        Ok(Struct {
            fields: self.fields,
            by_ordinal,
        })
    }
}

impl Codec for Struct {
    type Value = Fields;

    fn encode(&self, buf: &mut WriteBuffer, record: &Fields) -> Result<(), CodecError> {
        self.encode_with(buf, |name| record.get(name))
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Fields, CodecError> {
        let len = decode_map_header(buf, None)?;
        buf.nested(|buf| {
            let mut record = Fields::new();
            for _ in 0..len {
                let ordinal = Int.decode(buf)?;
                match self.by_ordinal.get(&ordinal) {
                    Some(&i) => {
                        let field = &self.fields[i];
                        record.insert(field.name.clone(), field.codec.decode_value(buf)?);
                    }
                    None => {
                        tracing::trace!(ordinal, "skipping unknown struct field");
                        skip_value(buf)?;
                    }
                }
            }
            Ok(record)
        })
    }
}

/// Dynamically a struct is a [`Value::Map`] keyed by field name.
impl DynCodec for Struct {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        let Value::Map(map) = value else {
            return Err(value.mismatch("map"));
        };
        self.encode_with(buf, |name| map.get(&Key::from(name)))
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf).map(Value::from)
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields()).finish()
    }
}

type Discriminator = dyn Fn(&Value) -> i64 + Send + Sync;

/// Tagged union codec: `ordinal -> codec` branches plus a discriminator that
/// picks the branch for an untyped value.
pub struct Union {
    branches: BTreeMap<i64, Box<dyn DynCodec>>,
    discriminator: Box<Discriminator>,
}

/// Builder for [`Union`].
pub struct UnionBuilder {
    branches: Vec<(i64, Box<dyn DynCodec>)>,
    discriminator: Box<Discriminator>,
}

impl Union {
    pub fn builder(discriminator: impl Fn(&Value) -> i64 + Send + Sync + 'static) -> UnionBuilder {
        UnionBuilder {
            branches: Vec::new(),
            discriminator: Box::new(discriminator),
        }
    }

    /// Encodes `value` under an explicit branch, bypassing the discriminator.
    pub fn encode_variant(
        &self,
        buf: &mut WriteBuffer,
        ordinal: i64,
        value: &Value,
    ) -> Result<(), CodecError> {
        let branch = self
            .branches
            .get(&ordinal)
            .ok_or(CodecError::UnknownBranch(ordinal))?;
        encode_array_header(buf, 2)?;
        encode_int(buf, ordinal);
        branch.encode_value(buf, value)
    }

    /// Decodes a union value together with the ordinal of its branch.
    pub fn decode_variant(&self, buf: &mut ReadBuffer<'_>) -> Result<(i64, Value), CodecError> {
        decode_array_header(buf, Some(2))?;
        buf.nested(|buf| {
            let ordinal = Int.decode(buf)?;
            let Some(branch) = self.branches.get(&ordinal) else {
                tracing::debug!(ordinal, "unknown union branch");
                return Err(CodecError::UnknownBranch(ordinal));
            };
            Ok((ordinal, branch.decode_value(buf)?))
        })
    }
}

impl UnionBuilder {
    /// Declares a branch.
    pub fn branch(mut self, ordinal: i64, codec: impl DynCodec + 'static) -> Self {
        self.branches.push((ordinal, Box::new(codec)));
        self
    }

    pub fn build(self) -> Result<Union, CodecError> {
        let mut branches = BTreeMap::new();
        for (ordinal, codec) in self.branches {
            if branches.insert(ordinal, codec).is_some() {
                return Err(CodecError::DuplicateOrdinal(ordinal));
            }
        }
        Ok(Union {
            branches,
            discriminator: self.discriminator,
        })
    }
}

impl Codec for Union {
    type Value = Value;

    fn encode(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode_variant(buf, (self.discriminator)(value), value)
    }

    fn decode(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode_variant(buf).map(|(_, value)| value)
    }
}

impl DynCodec for Union {
    fn encode_value(&self, buf: &mut WriteBuffer, value: &Value) -> Result<(), CodecError> {
        self.encode(buf, value)
    }

    fn decode_value(&self, buf: &mut ReadBuffer<'_>) -> Result<Value, CodecError> {
        self.decode(buf)
    }
}

impl fmt::Debug for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Union")
            .field("branches", &self.branches.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::{Any, Str, TypedArr};
    use crate::wire::tag;

    fn foo_bar() -> Struct {
        Struct::builder()
            .field(1, "foo", Int)
            .field(3, "bar", Str)
            .build()
            .unwrap()
    }

    fn record(entries: &[(&str, Value)]) -> Fields {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn enc<C: Codec>(codec: &C, value: &C::Value) -> Vec<u8> {
        let mut buf = WriteBuffer::new();
        codec.encode(&mut buf, value).expect("encode failed");
        buf.into_vec()
    }

    #[test]
    fn struct_encodes_as_ordinal_map() {
        let value = record(&[("foo", Value::Int(7)), ("bar", Value::from("7"))]);
        let data = enc(&foo_bar(), &value);
        assert_eq!(data, vec![0x82, 0x01, 0x07, 0x03, 0xA1, 0x37]);

        let decoded = foo_bar().decode(&mut ReadBuffer::new(&data)).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn struct_writes_only_present_fields() {
        let value = record(&[("bar", Value::from("x")), ("other", Value::Nil)]);
        assert_eq!(enc(&foo_bar(), &value), vec![0x81, 0x03, 0xA1, 0x78]);
        assert_eq!(enc(&foo_bar(), &Fields::new()), vec![0x80]);
    }

    #[test]
    fn struct_skips_unknown_ordinals() {
        let data = [
            0x83, //
            0x02, 0x92, 0xA1, 0x78, tag::FIX_EXT_1, 0x05, 0x00, // unknown, nested
            0x01, 0x07, //
            0x09, tag::BIN_8, 0x02, 0xAA, 0xBB, // unknown, trailing
        ];
        let mut buf = ReadBuffer::new(&data);
        let decoded = foo_bar().decode(&mut buf).unwrap();
        assert_eq!(decoded, record(&[("foo", Value::Int(7))]));
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn struct_field_type_mismatch() {
        let value = record(&[("foo", Value::from("seven"))]);
        let err = foo_bar().encode(&mut WriteBuffer::new(), &value).unwrap_err();
        assert!(err.is_type_error());

        let data = [0x81, 0x01, 0xA1, 0x37];
        let err = foo_bar().decode(&mut ReadBuffer::new(&data)).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn duplicate_field_ordinal() {
        let result = Struct::builder().field(1, "a", Int).field(1, "b", Str).build();
        assert!(matches!(result, Err(CodecError::DuplicateOrdinal(1))));
    }

    #[test]
    fn nested_struct_round_trip() {
        let inner = foo_bar();
        let outer = Struct::builder()
            .field(0, "id", Int)
            .field(1, "items", TypedArr::new(inner))
            .field(2, "extra", Any)
            .build()
            .unwrap();

        let item = Value::from(record(&[("foo", Value::Int(-3)), ("bar", Value::from("z"))]));
        let value = record(&[
            ("id", Value::Int(300)),
            ("items", Value::Array(vec![item.clone(), item])),
            ("extra", Value::Nil),
        ]);
        let data = enc(&outer, &value);
        assert_eq!(outer.decode(&mut ReadBuffer::new(&data)).unwrap(), value);
    }

    #[test]
    fn struct_debug_lists_fields() {
        assert_eq!(format!("{:?}", foo_bar()), r#"{1: "foo", 3: "bar"}"#);
    }

    fn int_or_str() -> Union {
        Union::builder(|v| match v {
            Value::Str(_) => 3,
            _ => 4,
        })
        .branch(4, Int)
        .branch(3, Str)
        .build()
        .unwrap()
    }

    #[test]
    fn union_encodes_as_pair() {
        let union = int_or_str();
        let data = enc(&union, &Value::Int(7));
        assert_eq!(data, vec![0x92, 0x04, 0x07]);
        assert_eq!(enc(&union, &Value::from("a")), vec![0x92, 0x03, 0xA1, 0x61]);

        let mut buf = ReadBuffer::new(&data);
        assert_eq!(union.decode_variant(&mut buf).unwrap(), (4, Value::Int(7)));
    }

    #[test]
    fn union_explicit_variant() {
        let union = int_or_str();
        let mut buf = WriteBuffer::new();
        union.encode_variant(&mut buf, 3, &Value::from("7")).unwrap();
        assert_eq!(buf.as_slice(), &[0x92, 0x03, 0xA1, 0x37]);

        let err = union
            .encode_variant(&mut WriteBuffer::new(), 5, &Value::Nil)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownBranch(5)));
    }

    #[test]
    fn union_rejects_unknown_branch() {
        let data = [0x92, 0x09, 0x07];
        let err = int_or_str().decode(&mut ReadBuffer::new(&data)).unwrap_err();
        assert!(matches!(err, CodecError::UnknownBranch(9)));
        assert!(err.is_type_error());
    }

    #[test]
    fn union_requires_two_elements() {
        let data = [0x93, 0x04, 0x07, 0xC0];
        let err = int_or_str().decode(&mut ReadBuffer::new(&data)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::HeaderMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn duplicate_branch_ordinal() {
        let result = Union::builder(|_| 0).branch(0, Int).branch(0, Str).build();
        assert!(matches!(result, Err(CodecError::DuplicateOrdinal(0))));
    }

    #[test]
    fn shared_across_threads() {
        let codec = Arc::new(foo_bar());
        let value = record(&[("foo", Value::Int(1))]);
        std::thread::scope(|s| {
            for _ in 0..4 {
                let codec = Arc::clone(&codec);
                let value = value.clone();
                s.spawn(move || {
                    let data = enc(&codec, &value);
                    assert_eq!(codec.decode(&mut ReadBuffer::new(&data)).unwrap(), value);
                });
            }
        });
    }

    #[test]
    fn struct_as_dynamic_map() {
        let codec = foo_bar();
        let value = Value::from(BTreeMap::from([("foo", Value::Int(7)), ("bar", Value::from("7"))]));
        let mut buf = WriteBuffer::new();
        codec.encode_value(&mut buf, &value).unwrap();
        assert_eq!(buf.as_slice(), &[0x82, 0x01, 0x07, 0x03, 0xA1, 0x37]);
        assert_eq!(
            codec.decode_value(&mut ReadBuffer::new(buf.as_slice())).unwrap(),
            value
        );

        let err = codec
            .encode_value(&mut WriteBuffer::new(), &Value::from(vec![1i64]))
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn self_nested_union_is_depth_limited() {
        let inner = int_or_str();
        let outer = Union::builder(|_| 0).branch(0, inner).build().unwrap();
        let data = [0x92, 0x00, 0x92, 0x04, 0x07];
        assert_eq!(outer.decode(&mut ReadBuffer::new(&data)).unwrap(), Value::Int(7));

        let err = outer
            .decode(&mut ReadBuffer::with_depth_limit(&data, 1))
            .unwrap_err();
        assert!(matches!(err, CodecError::DepthLimit(1)));
        assert!(!err.is_type_error());
    }
}
