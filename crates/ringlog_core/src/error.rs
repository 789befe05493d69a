//! Error types for ringlog core.

use std::fmt::Display;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ring buffer operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] ringlog_storage::StorageError),

    /// A record inside the valid span could not be decoded.
    #[error("corrupt record at offset {offset}: {message}")]
    CorruptRecord {
        /// Offset of the record boundary being decoded.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The ring configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A cursor was advanced past its last element.
    #[error("no such element")]
    NoSuchElement,
}

impl CoreError {
    /// Creates a corrupt record error.
    pub fn corrupt_record(offset: u64, message: impl Display) -> Self {
        Self::CorruptRecord {
            offset,
            message: message.to_string(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
