//! Thread-safe ring handles.
//!
//! [`RingLog`] guards a [`RingBuffer`] with a reader/writer lock. Readers
//! (`first`, `len`, cursors) share the lock; mutations take it exclusively.
//! `dequeue` and `pop` start from an upgradable read so an empty ring never
//! blocks readers.

use crate::config::RingConfig;
use crate::cursor::{Elements, ReverseElements};
use crate::error::CoreResult;
use crate::framing::{Framing, Queue, Stack};
use crate::header::Header;
use crate::ring::{RecoveryReport, RingBuffer};
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard};
use ringlog_storage::StorageBackend;

/// Cursor holding the read lock of a [`RingLog`].
pub type LockedElements<'a, S, F> = Elements<RwLockReadGuard<'a, RingBuffer<S, F>>>;

/// Reverse cursor holding the read lock of a [`RingStack`].
pub type LockedReverseElements<'a, S> = ReverseElements<RwLockReadGuard<'a, RingBuffer<S, Stack>>>;

/// A FIFO ring shared between threads.
pub type RingQueue<S> = RingLog<S, Queue>;

/// A ring that can also be read and trimmed from the newest end.
pub type RingStack<S> = RingLog<S, Stack>;

/// A ring buffer behind a reader/writer lock.
pub struct RingLog<S, F = Queue> {
    inner: RwLock<RingBuffer<S, F>>,
}

impl<S: StorageBackend, F: Framing> RingLog<S, F> {
    /// Opens a ring over `storage`, running recovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or storage fails.
    pub fn open(storage: S, config: RingConfig) -> CoreResult<Self> {
        Ok(Self::from_ring(RingBuffer::open(storage, config)?))
    }

    /// Wraps an already opened ring.
    #[must_use]
    pub fn from_ring(ring: RingBuffer<S, F>) -> Self {
        Self {
            inner: RwLock::new(ring),
        }
    }

    /// Appends `element` as the newest record.
    ///
    /// Returns `Ok(false)` if the element exceeds
    /// [`Self::max_single_element_size`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or an evicted record is corrupt.
    pub fn enqueue(&self, element: &[u8]) -> CoreResult<bool> {
        self.inner.write().append(element)
    }

    /// Removes and returns the oldest record.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn dequeue(&self) -> CoreResult<Option<Vec<u8>>> {
        let guard = self.inner.upgradable_read();
        let Some(element) = guard.first()? else {
            return Ok(None);
        };
        let mut ring = RwLockUpgradableReadGuard::upgrade(guard);
        ring.delete_first()?;
        Ok(Some(element))
    }

    /// Returns the oldest record without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn first(&self) -> CoreResult<Option<Vec<u8>>> {
        self.inner.read().first()
    }

    /// Same as [`Self::first`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn peek(&self) -> CoreResult<Option<Vec<u8>>> {
        self.first()
    }

    /// Deletes the oldest record. Returns `Ok(false)` if the ring is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn delete_first(&self) -> CoreResult<bool> {
        self.inner.write().delete_first()
    }

    /// Resets the ring to empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn clear(&self) -> CoreResult<()> {
        self.inner.write().clear()
    }

    /// Counts the records.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or a record is corrupt.
    pub fn len(&self) -> CoreResult<usize> {
        self.inner.read().len()
    }

    /// Returns `true` if the ring holds no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn is_empty(&self) -> CoreResult<bool> {
        self.inner.read().is_empty()
    }

    /// Iterates from oldest to newest, holding the read lock until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn iter(&self) -> CoreResult<LockedElements<'_, S, F>> {
        Elements::new(self.inner.read())
    }

    /// Runs `f` against the ring under a single read lock.
    pub fn read_batch<T>(&self, f: impl FnOnce(&RingBuffer<S, F>) -> T) -> T {
        f(&self.inner.read())
    }

    /// Largest payload a single append can store.
    #[must_use]
    pub fn max_single_element_size(&self) -> u64 {
        self.inner.read().max_single_element_size()
    }

    /// Bytes of the budget not occupied by live records.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn free_space(&self) -> CoreResult<u64> {
        self.inner.read().free_space()
    }

    /// Returns the current header.
    #[must_use]
    pub fn header(&self) -> Header {
        self.inner.read().header()
    }

    /// Returns what recovery did when the ring was opened.
    #[must_use]
    pub fn recovery(&self) -> RecoveryReport {
        self.inner.read().recovery()
    }

    /// Returns the unlocked ring.
    #[must_use]
    pub fn into_inner(self) -> RingBuffer<S, F> {
        self.inner.into_inner()
    }

    /// Releases the underlying storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.into_inner().into_storage()
    }
}

impl<S: StorageBackend> RingLog<S, Stack> {
    /// Appends `element` as the newest record.
    ///
    /// # Errors
    ///
    /// Same as [`Self::enqueue`].
    pub fn push(&self, element: &[u8]) -> CoreResult<bool> {
        self.enqueue(element)
    }

    /// Removes and returns the newest record.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn pop(&self) -> CoreResult<Option<Vec<u8>>> {
        let guard = self.inner.upgradable_read();
        let Some(element) = guard.last()? else {
            return Ok(None);
        };
        let mut ring = RwLockUpgradableReadGuard::upgrade(guard);
        ring.delete_last()?;
        Ok(Some(element))
    }

    /// Returns the newest record without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn last(&self) -> CoreResult<Option<Vec<u8>>> {
        self.inner.read().last()
    }

    /// Same as [`Self::last`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn peek_last(&self) -> CoreResult<Option<Vec<u8>>> {
        self.last()
    }

    /// Deletes the newest record. Returns `Ok(false)` if the ring is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn delete_last(&self) -> CoreResult<bool> {
        self.inner.write().delete_last()
    }

    /// Iterates from newest to oldest, holding the read lock until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn reverse_iter(&self) -> CoreResult<LockedReverseElements<'_, S>> {
        ReverseElements::new(self.inner.read())
    }
}

impl<S, F: Framing> std::fmt::Debug for RingLog<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingLog")
            .field("framing", &F::NAME)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use crate::testing::{drain, memory_queue, memory_stack};
    use proptest::prelude::*;
    use ringlog_storage::{FileBackend, InMemoryBackend};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn queue_round_trip() {
        let queue = memory_queue(1024);
        assert!(queue.enqueue(b"a").unwrap());
        assert!(queue.enqueue(b"b").unwrap());
        assert_eq!(queue.peek().unwrap(), Some(b"a".to_vec()));
        assert_eq!(queue.dequeue().unwrap(), Some(b"a".to_vec()));
        assert_eq!(queue.dequeue().unwrap(), Some(b"b".to_vec()));
        assert_eq!(queue.dequeue().unwrap(), None);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn stack_round_trip() {
        let stack = memory_stack(1024);
        stack.push(b"a").unwrap();
        stack.push(b"b").unwrap();
        assert_eq!(stack.peek_last().unwrap(), Some(b"b".to_vec()));
        assert_eq!(stack.peek().unwrap(), Some(b"a".to_vec()));
        assert_eq!(stack.pop().unwrap(), Some(b"b".to_vec()));
        assert_eq!(stack.pop().unwrap(), Some(b"a".to_vec()));
        assert_eq!(stack.pop().unwrap(), None);
    }

    #[test]
    fn read_batch_sees_one_snapshot() {
        let queue = memory_queue(1024);
        queue.enqueue(b"x").unwrap();
        queue.enqueue(b"y").unwrap();
        let (len, first) = queue.read_batch(|ring| (ring.len().unwrap(), ring.first().unwrap()));
        assert_eq!(len, 2);
        assert_eq!(first, Some(b"x".to_vec()));
    }

    #[test]
    fn file_backed_queue_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring.log");
        let config = RingConfig::new().max_size(HEADER_SIZE + 64).sync_on_commit(true);

        {
            let queue = RingQueue::open(FileBackend::open(&path).unwrap(), config.clone()).unwrap();
            for i in 0..40u8 {
                queue.enqueue(&[i; 3]).unwrap();
            }
        }

        let queue = RingQueue::open(FileBackend::open(&path).unwrap(), config).unwrap();
        assert!(queue.recovery().is_clean());
        let all = drain(&queue);
        assert_eq!(all.last(), Some(&vec![39u8; 3]));
        assert!(all.len() > 1);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let queue = Arc::new(memory_queue(HEADER_SIZE + 256));
        let writer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..500u32 {
                    queue.enqueue(&i.to_be_bytes()).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..100 {
                        // every snapshot is strictly increasing
                        let values: Vec<u32> = drain(&queue)
                            .into_iter()
                            .map(|e| u32::from_be_bytes(e.try_into().unwrap()))
                            .collect();
                        assert!(values.windows(2).all(|w| w[0] + 1 == w[1]));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(drain(&queue).last(), Some(&499u32.to_be_bytes().to_vec()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Append(Vec<u8>),
        DeleteFirst,
        DeleteLast,
        Reopen,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => prop::collection::vec(any::<u8>(), 0..40).prop_map(Op::Append),
            2 => Just(Op::DeleteFirst),
            2 => Just(Op::DeleteLast),
            1 => Just(Op::Reopen),
        ]
    }

    proptest! {
        /// The ring always holds a suffix of the appended sequence that
        /// includes the newest append, in order.
        #[test]
        fn stack_matches_model(ops in prop::collection::vec(op(), 1..120)) {
            let max_size = HEADER_SIZE + 100;
            let config = RingConfig::new().max_size(max_size);
            let mut stack = RingStack::open(InMemoryBackend::new(), config.clone()).unwrap();
            let mut model: VecDeque<Vec<u8>> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Append(element) => {
                        prop_assert!(stack.push(&element).unwrap());
                        model.push_back(element);
                        let actual = drain(&stack);
                        prop_assert!(actual.len() <= model.len());
                        while model.len() > actual.len() {
                            model.pop_front();
                        }
                        prop_assert_eq!(model.back(), actual.last());
                    }
                    Op::DeleteFirst => {
                        prop_assert_eq!(stack.dequeue().unwrap(), model.pop_front());
                    }
                    Op::DeleteLast => {
                        prop_assert_eq!(stack.pop().unwrap(), model.pop_back());
                    }
                    Op::Reopen => {
                        let data = stack.into_storage().data();
                        stack = RingStack::open(InMemoryBackend::with_data(data), config.clone()).unwrap();
                        prop_assert!(stack.recovery().is_clean());
                    }
                }

                let actual = drain(&stack);
                prop_assert_eq!(actual.iter().collect::<Vec<_>>(), model.iter().collect::<Vec<_>>());
                prop_assert_eq!(stack.len().unwrap(), model.len());

                let mut backward: Vec<Vec<u8>> = stack.reverse_iter().unwrap().collect::<CoreResult<_>>().unwrap();
                backward.reverse();
                prop_assert_eq!(backward, actual);

                let size = stack.read_batch(|ring| ring.storage().size().unwrap());
                prop_assert!(size <= max_size);
                if model.is_empty() {
                    prop_assert_eq!(size, HEADER_SIZE);
                }
            }
        }

        /// Appends only ever drop the oldest records.
        #[test]
        fn queue_keeps_newest_suffix(elements in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..30), 1..80)) {
            let queue = memory_queue(HEADER_SIZE + 90);
            let mut previous: Vec<Vec<u8>> = Vec::new();
            for element in elements {
                prop_assert!(queue.enqueue(&element).unwrap());
                let actual = drain(&queue);
                prop_assert_eq!(actual.last(), Some(&element));
                // survivors are a suffix of the previous contents
                let survivors = &actual[..actual.len() - 1];
                prop_assert!(previous.ends_with(survivors));
                previous = actual;
            }
        }

        /// Equal-sized records pack exactly, so a wrapping append evicts
        /// exactly the one record it overwrites.
        #[test]
        fn equal_records_evict_one_at_a_time(len in 1usize..30, count in 1usize..80) {
            let space = 90u64;
            let queue = memory_queue(HEADER_SIZE + space);
            let framed = Queue::overhead(len as u64) + len as u64;
            let capacity = (space / framed) as usize;

            let elements: Vec<Vec<u8>> = (0..count).map(|i| vec![i as u8; len]).collect();
            for (appended, element) in elements.iter().enumerate() {
                prop_assert!(queue.enqueue(element).unwrap());
                let kept = (appended + 1).min(capacity);
                prop_assert_eq!(drain(&queue), elements[appended + 1 - kept..=appended].to_vec());
            }
        }
    }
}
