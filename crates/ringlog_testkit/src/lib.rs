//! # ringlog Testkit
//!
//! Test utilities for ringlog.
//!
//! This crate provides:
//! - Ring fixtures over memory and temporary files
//! - A reference model for checking ring contents
//! - Property-based test generators using proptest
//! - A crash-simulating storage backend and crash recovery harness
//!
//! ## Usage
//!
//! ```rust
//! use ringlog_testkit::prelude::*;
//!
//! let queue = memory_queue(1024);
//! queue.enqueue(b"hello").unwrap();
//! assert_eq!(queue.len().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::{
    CrashPoint, CrashRecoveryHarness, CrashRecoveryResult, CrashableBackend, HistoryFraming,
    Mutation,
};
pub use fixtures::*;
pub use generators::*;
