//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for a ring buffer.
///
/// Storage backends are **opaque byte containers**. They provide positional
/// reads and writes, tail truncation and whole-content replacement. The ring
/// buffer owns all interpretation of the bytes - backends do not understand
/// headers or record framing.
///
/// # Atomicity contract
///
/// - `write_at` with `offset == 0` must be atomic: after a crash either the
///   whole write is visible or none of it is. The ring buffer only ever writes
///   its fixed-size header at offset 0.
/// - `delete_range` with `to == size()` (a truncation) must be atomic.
/// - All other writes may tear.
///
/// # Invariants
///
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `write_at` never leaves a gap: `offset <= size()`
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes the concatenation of `parts` starting at `offset`.
    ///
    /// Existing bytes are overwritten and the storage grows if the write
    /// extends past the current end.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is past the current end or an I/O error
    /// occurs.
    fn write_at(&mut self, offset: u64, parts: &[&[u8]]) -> StorageResult<()>;

    /// Removes the bytes in `from..to`, shifting any following bytes down.
    ///
    /// When `to == size()` this is a truncation and must be atomic.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is invalid or an I/O error occurs.
    fn delete_range(&mut self, from: u64, to: u64) -> StorageResult<()>;

    /// Replaces the entire content of the storage with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Flushes all pending writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush` - it ensures that
    /// file metadata (size, timestamps) is also durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to `new_size` bytes.
    ///
    /// Shorthand for `delete_range(new_size, size())`. Truncating to the
    /// current size is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let size = self.size()?;
        if new_size == size {
            return Ok(());
        }
        self.delete_range(new_size, size)
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn write_at(&mut self, offset: u64, parts: &[&[u8]]) -> StorageResult<()> {
        (**self).write_at(offset, parts)
    }

    fn delete_range(&mut self, from: u64, to: u64) -> StorageResult<()> {
        (**self).delete_range(from, to)
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        (**self).replace(data)
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }

    fn flush(&mut self) -> StorageResult<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        (**self).sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        (**self).truncate(new_size)
    }
}
