//! Dynamic value model.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::CodecError;

/// Field name → value, the decoded form of a struct.
pub type Fields = BTreeMap<String, Value>;

/// A self-describing value, as produced by the dynamic codec.
///
/// The three numeric variants compare by numeric value, so `Int(7)`, `Uint(7)`
/// and `Float(7.0)` are all equal.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bytes(Bytes),
    Str(String),
    Array(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Time(Timestamp),
}

/// A map key: a number, a string or a byte string.
///
/// `Int` and `Uint` compare by numeric value. Floats are ordered by
/// [`f64::total_cmp`] and never equal an integer key. Across kinds the order
/// is integers, floats, strings, bytes.
#[derive(Debug, Clone)]
pub enum Key {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
}

/// An instant as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Whole seconds, rounded toward negative infinity.
    pub const fn seconds(self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Sub-second part in nanoseconds, always in `0..1_000_000_000`.
    pub const fn subsec_nanos(self) -> u32 {
        (self.0.rem_euclid(1000) * 1_000_000) as u32
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = CodecError;

    fn try_from(t: SystemTime) -> Result<Self, Self::Error> {
        let millis = match t.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()),
            Err(e) => i64::try_from(e.duration().as_millis()).map(|m| -m),
        };
        millis
            .map(Self)
            .map_err(|_| CodecError::Overflow("timestamp"))
    }
}

impl From<Timestamp> for SystemTime {
    fn from(t: Timestamp) -> Self {
        let offset = Duration::from_millis(t.0.unsigned_abs());
        if t.0 < 0 {
            UNIX_EPOCH - offset
        } else {
            UNIX_EPOCH + offset
        }
    }
}

impl Key {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Self::Int(i) => Some(i128::from(*i)),
            Self::Uint(u) => Some(i128::from(*u)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) | Self::Uint(_) => 0,
            Self::Float(_) => 1,
            Self::Str(_) => 2,
            Self::Bytes(_) => 3,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            _ => match (self.integer(), other.integer()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

// Consistent with `Ord`: equal integers hash alike whatever their variant.
impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Int(_) | Self::Uint(_) => self.integer().hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
        }
    }
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Bytes(_) => "bytes",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Time(_) => "time",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it is an integer that fits.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Result<bool, CodecError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Integer conversion; a `Uint` beyond `i64::MAX` is an overflow.
    pub fn to_int(&self) -> Result<i64, CodecError> {
        match self {
            Self::Int(i) => Ok(*i),
            Self::Uint(u) => i64::try_from(*u).map_err(|_| CodecError::Overflow("int")),
            other => Err(other.mismatch("int")),
        }
    }

    /// Unsigned conversion; a negative `Int` is an underflow.
    pub fn to_uint(&self) -> Result<u64, CodecError> {
        match self {
            Self::Uint(u) => Ok(*u),
            Self::Int(i) => u64::try_from(*i).map_err(|_| CodecError::Underflow(*i)),
            other => Err(other.mismatch("uint")),
        }
    }

    pub fn to_float(&self) -> Result<f64, CodecError> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(i) => Ok(*i as f64),
            Self::Uint(u) => Ok(*u as f64),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn to_time(&self) -> Result<Timestamp, CodecError> {
        match self {
            Self::Time(t) => Ok(*t),
            other => Err(other.mismatch("time")),
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> CodecError {
        CodecError::ValueMismatch {
            expected,
            found: self.kind(),
        }
    }
}

// An integral float equals the integer with the same mathematical value. The
// cast saturates, which never lands on an i64/u64 for out-of-range floats.
fn int_eq_float(i: i128, f: f64) -> bool {
    f.fract() == 0.0 && f as i128 == i
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Int(a), Self::Uint(b)) | (Self::Uint(b), Self::Int(a)) => {
                i128::from(*a) == i128::from(*b)
            }
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                int_eq_float(i128::from(*i), *f)
            }
            (Self::Uint(u), Self::Float(f)) | (Self::Float(f), Self::Uint(u)) => {
                int_eq_float(i128::from(*u), *f)
            }
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            _ => false,
        }
    }
}

// -- Conversions into Value --

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Self::Time(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Key>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// Values up to `i64::MAX` become `Key::Int`.
impl From<u64> for Key {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Self::Uint(u), Self::Int)
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => Self::Int(i),
            Key::Uint(u) => Self::Uint(u),
            Key::Float(f) => Self::Float(f),
            Key::Str(s) => Self::Str(s),
            Key::Bytes(b) => Self::Bytes(b),
        }
    }
}

// -- Conversions out of Value --

/// Extraction of a typed value from a dynamic [`Value`].
///
/// This is what lets typed codecs sit inside struct fields and union branches,
/// which carry dynamic values.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

/// Extraction of a typed map key from a dynamic [`Key`].
pub trait FromKey: Sized {
    fn from_key(key: Key) -> Result<Self, CodecError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl FromValue for () {
    // Nil ignores its input, so any value is accepted.
    fn from_value(_: Value) -> Result<Self, CodecError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.to_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.to_int()
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.to_uint()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.to_float()
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Str(s) => Ok(Bytes::from(s)),
            other => Err(other.mismatch("bytes")),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.to_time()
    }
}

impl FromValue for Key {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Int(i) => Ok(Key::Int(i)),
            Value::Uint(u) => Ok(Key::from(u)),
            Value::Float(f) => Ok(Key::Float(f)),
            Value::Str(s) => Ok(Key::Str(s)),
            Value::Bytes(b) => Ok(Key::Bytes(b)),
            other => Err(other.mismatch("map key")),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other.mismatch("array")),
        }
    }
}

impl<K: FromKey + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((K::from_key(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(other.mismatch("map")),
        }
    }
}

impl FromKey for Key {
    fn from_key(key: Key) -> Result<Self, CodecError> {
        Ok(key)
    }
}

fn key_mismatch(expected: &'static str, key: &Key) -> CodecError {
    CodecError::ValueMismatch {
        expected,
        found: key.kind(),
    }
}

impl FromKey for i64 {
    fn from_key(key: Key) -> Result<Self, CodecError> {
        match key {
            Key::Int(i) => Ok(i),
            Key::Uint(u) => i64::try_from(u).map_err(|_| CodecError::Overflow("int")),
            other => Err(key_mismatch("int", &other)),
        }
    }
}

impl FromKey for u64 {
    fn from_key(key: Key) -> Result<Self, CodecError> {
        match key {
            Key::Uint(u) => Ok(u),
            Key::Int(i) => u64::try_from(i).map_err(|_| CodecError::Underflow(i)),
            other => Err(key_mismatch("uint", &other)),
        }
    }
}

impl FromKey for String {
    fn from_key(key: Key) -> Result<Self, CodecError> {
        match key {
            Key::Str(s) => Ok(s),
            other => Err(key_mismatch("string", &other)),
        }
    }
}

impl FromKey for Bytes {
    fn from_key(key: Key) -> Result<Self, CodecError> {
        match key {
            Key::Bytes(b) => Ok(b),
            Key::Str(s) => Ok(Bytes::from(s)),
            other => Err(key_mismatch("bytes", &other)),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Time(t) => write!(f, "time({}ms)", t.millis()),
        }
    }
}
