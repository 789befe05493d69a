//! Helpers shared by the unit tests of this crate.

use crate::config::RingConfig;
use crate::error::CoreResult;
use crate::framing::{Framing, Queue, Stack};
use crate::log::{RingLog, RingQueue, RingStack};
use crate::ring::RingBuffer;
use ringlog_storage::{InMemoryBackend, StorageBackend};

pub(crate) fn queue(max_size: u64) -> RingBuffer<InMemoryBackend, Queue> {
    RingBuffer::open(InMemoryBackend::new(), RingConfig::new().max_size(max_size)).unwrap()
}

pub(crate) fn stack(max_size: u64) -> RingBuffer<InMemoryBackend, Stack> {
    RingBuffer::open(InMemoryBackend::new(), RingConfig::new().max_size(max_size)).unwrap()
}

pub(crate) fn memory_queue(max_size: u64) -> RingQueue<InMemoryBackend> {
    RingLog::from_ring(queue(max_size))
}

pub(crate) fn memory_stack(max_size: u64) -> RingStack<InMemoryBackend> {
    RingLog::from_ring(stack(max_size))
}

/// Every record of `ring`, oldest first.
pub(crate) fn contents<S: StorageBackend, F: Framing>(ring: &RingBuffer<S, F>) -> Vec<Vec<u8>> {
    ring.iter().unwrap().collect::<CoreResult<Vec<_>>>().unwrap()
}

/// Every record of a locked ring, oldest first.
pub(crate) fn drain<S: StorageBackend, F: Framing>(log: &RingLog<S, F>) -> Vec<Vec<u8>> {
    log.read_batch(contents)
}
