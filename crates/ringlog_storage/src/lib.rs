//! # ringlog Storage
//!
//! Storage backend trait and implementations for ringlog.
//!
//! This crate provides the lowest-level storage abstraction for the ring
//! buffer. Storage backends are **opaque byte containers** - they do not
//! interpret the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple byte containers (read, positional write, truncate, replace)
//! - No knowledge of the ring header or record framing
//! - Must be `Send + Sync` so a ring buffer can be shared across threads
//! - Header writes (at offset 0) and tail truncations are atomic
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral rings
//! - [`FileBackend`] - For persistent rings using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use ringlog_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write_at(0, &[b"hello", b" world"]).unwrap();
//! let data = backend.read_at(6, 5).unwrap();
//! assert_eq!(&data, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
