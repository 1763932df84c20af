//! Value types carried by the dynamic codec.

mod value;

pub use value::{FromKey, FromValue, Fields, Key, Timestamp, Value};
