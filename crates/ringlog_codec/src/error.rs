//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding a length indicator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ends before the length indicator does.
    #[error("unexpected end of input: need {needed} bytes, have {available}")]
    UnexpectedEof {
        /// Bytes required to finish decoding.
        needed: usize,
        /// Bytes available in the buffer.
        available: usize,
    },

    /// The tag byte announces more length bytes than a `u64` holds.
    #[error("invalid length indicator tag {tag} (max {max})")]
    InvalidTag {
        /// The tag byte that was read.
        tag: u8,
        /// The largest permitted tag.
        max: u8,
    },
}
