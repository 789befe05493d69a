//! Cursors over the records of a ring.
//!
//! A cursor holds anything that dereferences to a [`RingBuffer`]: a plain
//! reference for the unlocked ring, or a read guard when iterating a
//! [`crate::RingLog`], which keeps writers out until the cursor is dropped.
//!
//! Cursors snapshot the segment bounds when created and only decode records
//! on demand. [`Elements::has_next`] never touches storage.

use crate::error::{CoreError, CoreResult};
use crate::framing::{Framing, Stack};
use crate::ring::{RingBuffer, Segment};
use ringlog_storage::StorageBackend;
use std::ops::Deref;

/// Oldest-to-newest cursor.
pub struct Elements<R> {
    ring: R,
    pos: u64,
    end: u64,
    then: Option<Segment>,
    failed: bool,
}

impl<S, F, R> Elements<R>
where
    S: StorageBackend,
    F: Framing,
    R: Deref<Target = RingBuffer<S, F>>,
{
    pub(crate) fn new(ring: R) -> CoreResult<Self> {
        let span = ring.span()?;
        Ok(Self {
            pos: span.older.start,
            end: span.older.end,
            then: span.newer,
            ring,
            failed: false,
        })
    }

    /// Returns `true` if another record remains.
    ///
    /// Always `false` after a decode error.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.failed && (self.pos < self.end || self.then.is_some_and(|s| !s.is_empty()))
    }

    /// Reads the next record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoSuchElement`] past the last record, or the
    /// storage or decode error that stopped the cursor.
    pub fn next_element(&mut self) -> CoreResult<Vec<u8>> {
        self.advance(|ring, pos, end| ring.read_record(pos, end))
    }

    /// Moves past the next record without reading its payload.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_element`].
    pub fn skip_element(&mut self) -> CoreResult<()> {
        self.advance(|ring, pos, end| Ok(((), ring.skip_record(pos, end)?)))
    }

    fn advance<T>(
        &mut self,
        step: impl FnOnce(&RingBuffer<S, F>, u64, u64) -> CoreResult<(T, u64)>,
    ) -> CoreResult<T> {
        if !self.has_next() {
            return Err(CoreError::NoSuchElement);
        }
        if self.pos >= self.end {
            if let Some(segment) = self.then.take() {
                self.pos = segment.start;
                self.end = segment.end;
            }
        }
        match step(&self.ring, self.pos, self.end) {
            Ok((value, next)) => {
                self.pos = next;
                Ok(value)
            }
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }
}

impl<S, F, R> Iterator for Elements<R>
where
    S: StorageBackend,
    F: Framing,
    R: Deref<Target = RingBuffer<S, F>>,
{
    type Item = CoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_element())
    }
}

/// Newest-to-oldest cursor, available on stack rings.
pub struct ReverseElements<R> {
    ring: R,
    pos: u64,
    lower: u64,
    then: Option<Segment>,
    failed: bool,
}

impl<S, R> ReverseElements<R>
where
    S: StorageBackend,
    R: Deref<Target = RingBuffer<S, Stack>>,
{
    pub(crate) fn new(ring: R) -> CoreResult<Self> {
        let span = ring.span()?;
        let (first, then) = match span.newer {
            Some(newer) => (newer, Some(span.older)),
            None => (span.older, None),
        };
        Ok(Self {
            pos: first.end,
            lower: first.start,
            then,
            ring,
            failed: false,
        })
    }

    /// Returns `true` if another record remains.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.failed && (self.pos > self.lower || self.then.is_some_and(|s| !s.is_empty()))
    }

    /// Reads the next older record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoSuchElement`] past the oldest record, or the
    /// storage or decode error that stopped the cursor.
    pub fn next_element(&mut self) -> CoreResult<Vec<u8>> {
        self.advance(|ring, pos, lower| ring.read_record_backward(pos, lower))
    }

    /// Moves past the next older record without reading its payload.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_element`].
    pub fn skip_element(&mut self) -> CoreResult<()> {
        self.advance(|ring, pos, lower| Ok(((), ring.skip_record_backward(pos, lower)?)))
    }

    fn advance<T>(
        &mut self,
        step: impl FnOnce(&RingBuffer<S, Stack>, u64, u64) -> CoreResult<(T, u64)>,
    ) -> CoreResult<T> {
        if !self.has_next() {
            return Err(CoreError::NoSuchElement);
        }
        if self.pos <= self.lower {
            if let Some(segment) = self.then.take() {
                self.pos = segment.end;
                self.lower = segment.start;
            }
        }
        match step(&self.ring, self.pos, self.lower) {
            Ok((value, next)) => {
                self.pos = next;
                Ok(value)
            }
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }
}

impl<S, R> Iterator for ReverseElements<R>
where
    S: StorageBackend,
    R: Deref<Target = RingBuffer<S, Stack>>,
{
    type Item = CoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_element())
    }
}
