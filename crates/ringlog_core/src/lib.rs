//! # ringlog Core
//!
//! A crash-consistent ring buffer of variable-length byte records, stored in
//! a single byte container behind [`ringlog_storage::StorageBackend`].
//!
//! This crate provides:
//! - [`RingBuffer`] - the unlocked ring with append, deletion and recovery
//! - [`RingQueue`] / [`RingStack`] - lock-guarded handles for shared use
//! - [`Elements`] / [`ReverseElements`] - lazy cursors over the records
//!
//! ## Storage layout
//!
//! ```text
//! | header (32) | records ... |
//! ```
//!
//! Each record is `LI(len) || payload` on a queue, with a trailing
//! `ReverseLI(len)` on a stack. When an append would exceed the configured
//! budget, writing wraps back to the start and the oldest records are
//! evicted. Every append goes through a pre-commit / write / commit sequence
//! on the header, so a crash at any point recovers to a consistent ring.
//!
//! ## Example
//!
//! ```rust
//! use ringlog_core::{RingConfig, RingQueue};
//! use ringlog_storage::InMemoryBackend;
//!
//! let queue = RingQueue::open(InMemoryBackend::new(), RingConfig::new().max_size(4096)).unwrap();
//! queue.enqueue(b"first").unwrap();
//! queue.enqueue(b"second").unwrap();
//! assert_eq!(queue.dequeue().unwrap(), Some(b"first".to_vec()));
//! assert_eq!(queue.len().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cursor;
mod error;
mod framing;
mod header;
mod log;
mod ring;
#[cfg(test)]
mod testing;

pub use config::RingConfig;
pub use cursor::{Elements, ReverseElements};
pub use error::{CoreError, CoreResult};
pub use framing::{Framing, Queue, Stack};
pub use header::{Header, WriteAttempt, HEADER_SIZE};
pub use log::{LockedElements, LockedReverseElements, RingLog, RingQueue, RingStack};
pub use ring::{RecoveryReport, RingBuffer};

/// Cursor over an unlocked [`RingBuffer`].
pub type Iter<'a, S, F> = Elements<&'a RingBuffer<S, F>>;

/// Reverse cursor over an unlocked stack [`RingBuffer`].
pub type ReverseIter<'a, S> = ReverseElements<&'a RingBuffer<S, Stack>>;
