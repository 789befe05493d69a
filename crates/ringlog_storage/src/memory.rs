//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory storage backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Crash simulation (snapshot the bytes with [`InMemoryBackend::data`])
/// - Ephemeral rings that don't need persistence
///
/// Every operation holds the internal lock for its whole duration, so all
/// writes are atomic with respect to each other.
///
/// # Example
///
/// ```rust
/// use ringlog_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write_at(0, &[b"test data"]).unwrap();
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of all data in the backend.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let offset_usize = offset as usize;
        let end = offset_usize.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset_usize..end].to_vec())
    }

    fn write_at(&mut self, offset: u64, parts: &[&[u8]]) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if offset > size {
            return Err(StorageError::WritePastEnd { offset, size });
        }

        let mut pos = offset as usize;
        for part in parts {
            let overlap = data.len().saturating_sub(pos).min(part.len());
            data[pos..pos + overlap].copy_from_slice(&part[..overlap]);
            data.extend_from_slice(&part[overlap..]);
            pos += part.len();
        }
        Ok(())
    }

    fn delete_range(&mut self, from: u64, to: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if from > to || to > size {
            return Err(StorageError::InvalidRange { from, to, size });
        }

        data.drain(from as usize..to as usize);
        Ok(())
    }

    fn replace(&mut self, new_data: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        data.clear();
        data.extend_from_slice(new_data);
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn flush(&mut self) -> StorageResult<()> {
        // In-memory backend has no pending writes
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        // In-memory backend has no metadata to sync
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.data().is_empty());
    }

    #[test]
    fn memory_write_concatenates_parts() {
        let mut backend = InMemoryBackend::new();
        backend.write_at(0, &[b"hel", b"lo", b""]).unwrap();
        assert_eq!(backend.data(), b"hello");
    }

    #[test]
    fn memory_write_overwrites_and_extends() {
        let mut backend = InMemoryBackend::with_data(b"hello".to_vec());
        backend.write_at(3, &[b"p me"]).unwrap();
        assert_eq!(backend.data(), b"help me");
    }

    #[test]
    fn memory_write_inside_keeps_tail() {
        let mut backend = InMemoryBackend::with_data(b"hello world".to_vec());
        backend.write_at(0, &[b"J"]).unwrap();
        assert_eq!(backend.data(), b"Jello world");
    }

    #[test]
    fn memory_write_past_end_fails() {
        let mut backend = InMemoryBackend::with_data(b"abc".to_vec());
        let result = backend.write_at(4, &[b"x"]);
        assert!(matches!(result, Err(StorageError::WritePastEnd { .. })));
    }

    #[test]
    fn memory_read_at_past_end_fails() {
        let backend = InMemoryBackend::with_data(b"hello".to_vec());

        let result = backend.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));

        let result = backend.read_at(3, 10);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn memory_empty_read() {
        let backend = InMemoryBackend::with_data(b"hello".to_vec());
        let data = backend.read_at(2, 0).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn memory_delete_middle_shifts_tail() {
        let mut backend = InMemoryBackend::with_data(b"hello world".to_vec());
        backend.delete_range(2, 6).unwrap();
        assert_eq!(backend.data(), b"heworld");
    }

    #[test]
    fn memory_truncate_partial() {
        let mut backend = InMemoryBackend::with_data(b"hello world".to_vec());
        backend.truncate(5).unwrap();
        assert_eq!(backend.size().unwrap(), 5);
        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
    }

    #[test]
    fn memory_truncate_to_current_size_is_noop() {
        let mut backend = InMemoryBackend::with_data(b"abc".to_vec());
        backend.truncate(3).unwrap();
        assert_eq!(backend.data(), b"abc");
    }

    #[test]
    fn memory_truncate_to_larger_size_fails() {
        let mut backend = InMemoryBackend::with_data(b"hello".to_vec());
        let result = backend.truncate(100);
        assert!(matches!(result, Err(StorageError::InvalidRange { .. })));
    }

    #[test]
    fn memory_replace() {
        let mut backend = InMemoryBackend::with_data(b"some data".to_vec());
        backend.replace(b"new").unwrap();
        assert_eq!(backend.data(), b"new");
    }

    proptest! {
        #[test]
        fn memory_write_matches_vec_model(
            initial in prop::collection::vec(any::<u8>(), 0..64),
            patch in prop::collection::vec(any::<u8>(), 0..64),
            offset_seed in any::<usize>(),
        ) {
            let offset = offset_seed % (initial.len() + 1);
            let mut backend = InMemoryBackend::with_data(initial.clone());
            backend.write_at(offset as u64, &[&patch]).unwrap();

            let mut model = initial;
            for (i, byte) in patch.iter().enumerate() {
                if offset + i < model.len() {
                    model[offset + i] = *byte;
                } else {
                    model.push(*byte);
                }
            }
            prop_assert_eq!(backend.data(), model);
        }
    }
}
