//! Property-based test generators using proptest.
//!
//! Provides strategies for element payloads, ring budgets and operation
//! sequences.

use proptest::prelude::*;
use ringlog_core::HEADER_SIZE;

/// An operation applied to a ring in property tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingOp {
    /// Append an element.
    Append(Vec<u8>),
    /// Delete the oldest element.
    DeleteFirst,
    /// Delete the newest element (stack rings only).
    DeleteLast,
    /// Reset the ring.
    Clear,
    /// Close and reopen the storage.
    Reopen,
}

/// Strategy for element payloads of up to `max_len` bytes.
pub fn element_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for ring budgets small enough to wrap often.
pub fn max_size_strategy() -> impl Strategy<Value = u64> {
    (HEADER_SIZE + 16)..(HEADER_SIZE + 512)
}

/// Strategy for a single operation. Without `with_delete_last`, deletions
/// always come from the oldest end.
pub fn ring_op_strategy(max_len: usize, with_delete_last: bool) -> impl Strategy<Value = RingOp> {
    prop_oneof![
        8 => element_strategy(max_len).prop_map(RingOp::Append),
        3 => Just(RingOp::DeleteFirst),
        2 => Just(RingOp::DeleteLast),
        1 => Just(RingOp::Clear),
        1 => Just(RingOp::Reopen),
    ]
    .prop_map(move |op| match op {
        RingOp::DeleteLast if !with_delete_last => RingOp::DeleteFirst,
        op => op,
    })
}

/// Strategy for operation sequences.
pub fn ring_ops_strategy(
    max_len: usize,
    with_delete_last: bool,
    count: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<RingOp>> {
    prop::collection::vec(ring_op_strategy(max_len, with_delete_last), count)
}

/// Strategy for the byte offset of a single-bit corruption inside `len` bytes.
pub fn corruption_strategy(len: usize) -> impl Strategy<Value = (usize, u8)> {
    (0..len.max(1), 0..8u8)
}
