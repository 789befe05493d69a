//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// A write would leave a gap between the current end and the write offset.
    #[error("write at offset {offset} would leave a gap past end of storage (size {size})")]
    WritePastEnd {
        /// The requested write offset.
        offset: u64,
        /// The current storage size.
        size: u64,
    },

    /// A range passed to a delete or truncate is not valid for the current size.
    #[error("invalid range {from}..{to} for storage of size {size}")]
    InvalidRange {
        /// Start of the range.
        from: u64,
        /// End of the range.
        to: u64,
        /// The current storage size.
        size: u64,
    },

    /// Another owner holds the storage exclusively.
    #[error("storage locked: another process has exclusive access")]
    Locked,
}
