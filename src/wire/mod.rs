//! Wire-level grammar: tag bytes and tag-driven traversal.

pub mod copy;
pub mod tag;

pub use copy::{copy_value, skip_value};
