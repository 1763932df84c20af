//! Error types for encoding and decoding.

use std::string::FromUtf8Error;

/// Errors that can occur while encoding or decoding a value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected tag 0x{tag:02x} ({expected} expected)")]
    UnexpectedTag { tag: u8, expected: &'static str },

    #[error("unknown union branch ordinal {0}")]
    UnknownBranch(i64),

    #[error("value mismatch: expected {expected}, got {found}")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("length limit exceeded: {0}")]
    LengthLimit(usize),

    #[error("{0} out of range")]
    Overflow(&'static str),

    #[error("unsigned integer underflow: {0}")]
    Underflow(i64),

    #[error("invalid header size {found} ({expected} expected)")]
    HeaderMismatch { expected: usize, found: usize },

    #[error("need {needed} bytes but only {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("nesting deeper than {0} levels")]
    DepthLimit(usize),

    #[error("duplicate ordinal {0}")]
    DuplicateOrdinal(i64),
}

impl CodecError {
    /// Shorthand for a tag that is not valid for the requested decode.
    pub(crate) fn tag(tag: u8, expected: &'static str) -> Self {
        Self::UnexpectedTag { tag, expected }
    }

    /// Returns `true` for errors caused by reading a value of the wrong kind.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedTag { .. } | Self::UnknownBranch(_) | Self::ValueMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_error_message() {
        let err = CodecError::tag(0xa1, "bool");
        assert_eq!(err.to_string(), "unexpected tag 0xa1 (bool expected)");
        assert!(err.is_type_error());
    }

    #[test]
    fn limit_errors_are_not_type_errors() {
        assert!(!CodecError::LengthLimit(1 << 33).is_type_error());
        assert!(!CodecError::Underflow(-1).is_type_error());
        assert!(!CodecError::DepthLimit(128).is_type_error());
    }
}
