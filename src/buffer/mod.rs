//! Byte cursors the codecs write to and read from.
//!
//! All multi-byte integers and floats are big-endian.

pub mod reader;
pub mod writer;

pub use reader::{DEFAULT_DEPTH_LIMIT, ReadBuffer};
pub use writer::WriteBuffer;
