//! The unlocked ring buffer.
//!
//! [`RingBuffer`] implements the on-disk algorithms: the three-step append,
//! deletions from either end, wraparound and recovery. It takes `&mut self`
//! for every mutation; [`crate::RingLog`] wraps it in a reader/writer lock
//! for shared use.
//!
//! ## Append protocol
//!
//! ```text
//! 1. pre-commit   header <- (dirty_start, new dirty_end, write_start, write_end)
//! 2. write        LI(len) || payload [|| ReverseLI(len)] at write_start
//! 3. commit       header <- (write_end, dirty_end after append, -1, -1)
//! ```
//!
//! The pre-commit header already describes a valid state that excludes the
//! range being written, so a crash at any point leaves a header recovery can
//! interpret without looking at the record bytes.

use crate::config::RingConfig;
use crate::cursor::{Elements, ReverseElements};
use crate::error::{CoreError, CoreResult};
use crate::framing::{Framing, Queue, Stack};
use crate::header::{Header, WriteAttempt, HEADER_SIZE};
use ringlog_codec::li;
use ringlog_storage::StorageBackend;
use std::marker::PhantomData;
use tracing::{debug, info, trace, warn};

/// What the recovery pass did when the ring was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Storage was empty or shorter than a header and was initialised.
    pub initialized: bool,
    /// Header offsets were out of bounds and had to be clamped.
    pub clamped: bool,
    /// An append was interrupted between pre-commit and commit.
    pub interrupted: Option<WriteAttempt>,
    /// The interrupted append had evicted every record, so the ring was reset.
    pub reset: bool,
}

impl RecoveryReport {
    /// Returns `true` if the stored header needed no repair.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.clamped && self.interrupted.is_none()
    }
}

/// A contiguous byte range of the valid span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) start: u64,
    pub(crate) end: u64,
}

impl Segment {
    const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// The valid span split into at most two segments, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) older: Segment,
    pub(crate) newer: Option<Segment>,
}

impl Span {
    const EMPTY: Self = Self {
        older: Segment::new(HEADER_SIZE, HEADER_SIZE),
        newer: None,
    };

    fn newer_non_empty(&self) -> Option<Segment> {
        self.newer.filter(|s| !s.is_empty())
    }

    fn is_empty(&self) -> bool {
        self.older.is_empty() && self.newer_non_empty().is_none()
    }

    fn bytes(&self) -> u64 {
        self.older.len() + self.newer.map_or(0, |s| s.len())
    }
}

/// Where a record sits in storage.
#[derive(Debug, Clone, Copy)]
struct Located {
    start: u64,
    data_start: u64,
    len: u64,
    end: u64,
}

/// A crash-consistent ring of variable-length records.
///
/// `F` selects the framing: [`Queue`] for a FIFO ring, [`Stack`] to also
/// allow reading and deleting from the newest end.
pub struct RingBuffer<S, F = Queue> {
    storage: S,
    config: RingConfig,
    header: Header,
    recovery: RecoveryReport,
    _framing: PhantomData<F>,
}

impl<S: StorageBackend, F: Framing> RingBuffer<S, F> {
    /// Opens a ring over `storage`, running recovery.
    ///
    /// Storage shorter than a header is initialised as an empty ring.
    /// Otherwise the stored header is clamped into bounds and any interrupted
    /// append is rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or storage fails.
    pub fn open(storage: S, config: RingConfig) -> CoreResult<Self> {
        config.validate::<F>()?;

        let mut ring = Self {
            storage,
            config,
            header: Header::empty(),
            recovery: RecoveryReport::default(),
            _framing: PhantomData,
        };

        let content = ring.storage.size()?;
        if content < HEADER_SIZE {
            info!(content, framing = F::NAME, "initialising empty ring");
            ring.clear()?;
            ring.recovery.initialized = true;
            return Ok(ring);
        }

        let bytes = ring.storage.read_at(0, HEADER_SIZE as usize)?;
        let raw = <[u8; HEADER_SIZE as usize]>::try_from(bytes.as_slice())
            .map_err(|_| CoreError::corrupt_record(0, "short header read"))?;
        ring.recovery = ring.recover(Header::decode(&raw))?;

        if content > ring.config.max_size {
            warn!(
                content,
                max_size = ring.config.max_size,
                "storage exceeds configured max size, space is reclaimed on the next wraparound"
            );
        }
        info!(
            framing = F::NAME,
            dirty_start = ring.header.dirty_start,
            dirty_end = ring.header.dirty_end,
            clean = ring.recovery.is_clean(),
            "ring opened"
        );
        Ok(ring)
    }

    /// Appends `element` as the newest record, evicting the oldest records
    /// as needed.
    ///
    /// Returns `Ok(false)` without touching storage if the element can never
    /// fit (see [`Self::max_single_element_size`]).
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or a record in the way is corrupt.
    /// A failed append leaves the header pre-committed; the next mutation or
    /// the next open rolls it back.
    pub fn append(&mut self, element: &[u8]) -> CoreResult<bool> {
        self.repair_if_interrupted()?;

        let len = element.len() as u64;
        if len > self.max_single_element_size() {
            debug!(len, "element can never fit, rejected");
            return Ok(false);
        }

        let framed = F::overhead(len) + len;
        let Header {
            dirty_start,
            dirty_end,
            ..
        } = self.header;
        let content = self.storage.size()?;

        let wraps = dirty_start + framed > self.config.max_size;
        let write_start = if wraps { HEADER_SIZE } else { dirty_start };
        let write_end = write_start + framed;

        // Records the write may run over, as (oldest record, end of their segment).
        let at_risk = if wraps {
            if content > dirty_start {
                // everything from the write cursor to the physical end is evicted
                self.storage.truncate(dirty_start)?;
            }
            debug!(dirty_start, write_end, "wrapping around");
            let oldest = if dirty_end < dirty_start {
                dirty_end
            } else {
                HEADER_SIZE
            };
            Some(Segment::new(oldest, dirty_start))
        } else if dirty_end < dirty_start {
            None
        } else {
            Some(Segment::new(dirty_end.min(content), content))
        };

        let (pre_commit_end, commit_end) = match at_risk {
            None => (dirty_end, dirty_end),
            Some(segment) => match self.first_boundary_from(segment, write_end)? {
                Some(boundary) => (boundary, boundary),
                // every record of the segment is overwritten
                None if wraps => (dirty_start, write_start),
                None => (HEADER_SIZE, HEADER_SIZE),
            },
        };
        if pre_commit_end != dirty_end {
            debug!(from = dirty_end, to = pre_commit_end, "evicting oldest records");
        }

        let attempt = WriteAttempt {
            start: write_start,
            end: write_end,
        };
        self.write_header(
            Header::pending(dirty_start, pre_commit_end, attempt),
            "pre-commit",
        )?;

        let prefix = li::encode_prefix(len);
        let suffix = F::encode_suffix(len);
        self.storage
            .write_at(write_start, &[&prefix, element, &suffix])?;
        if self.config.sync_on_commit {
            self.storage.sync()?;
        }

        self.write_header(Header::committed(write_end, commit_end), "commit")?;
        Ok(true)
    }

    /// Deletes the oldest record.
    ///
    /// Returns `Ok(false)` if the ring is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the oldest record is corrupt.
    pub fn delete_first(&mut self) -> CoreResult<bool> {
        self.repair_if_interrupted()?;

        let span = self.span()?;
        let (segment, rest) = if !span.older.is_empty() {
            (span.older, span.newer_non_empty())
        } else if let Some(newer) = span.newer_non_empty() {
            (newer, None)
        } else {
            return Ok(false);
        };

        let next = self.locate(segment.start, segment.end)?.end;
        let dirty_end = if next < segment.end {
            Some(next)
        } else {
            rest.map(|r| r.start)
        };

        match dirty_end {
            Some(dirty_end) => {
                let next_header = Header::committed(self.header.dirty_start, dirty_end);
                self.write_header(next_header, "delete first")?;
            }
            None => {
                debug!("last record deleted, clearing");
                self.clear()?;
            }
        }
        Ok(true)
    }

    /// Resets the ring to empty, shrinking storage to just the header.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn clear(&mut self) -> CoreResult<()> {
        let header = Header::empty();
        self.storage.replace(&header.encode())?;
        if self.config.sync_on_commit {
            self.storage.sync()?;
        }
        self.header = header;
        debug!("ring cleared");
        Ok(())
    }

    /// Returns the oldest record without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn first(&self) -> CoreResult<Option<Vec<u8>>> {
        self.iter()?.next().transpose()
    }

    /// Counts the records by walking the ring.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or a record is corrupt.
    pub fn len(&self) -> CoreResult<usize> {
        let mut elements = self.iter()?;
        let mut count = 0;
        while elements.has_next() {
            elements.skip_element()?;
            count += 1;
        }
        Ok(count)
    }

    /// Returns `true` if the ring holds no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.span()?.is_empty())
    }

    /// Iterates from the oldest to the newest record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn iter(&self) -> CoreResult<Elements<&Self>> {
        Elements::new(self)
    }

    /// Largest payload a single append can store.
    #[must_use]
    pub fn max_single_element_size(&self) -> u64 {
        F::max_payload(self.config.max_size - HEADER_SIZE).unwrap_or(0)
    }

    /// Bytes of the budget not occupied by live records.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn free_space(&self) -> CoreResult<u64> {
        let used = self.span()?.bytes();
        Ok(self.config.max_size.saturating_sub(HEADER_SIZE + used))
    }

    /// Returns the current header.
    #[must_use]
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns what recovery did when the ring was opened.
    #[must_use]
    pub fn recovery(&self) -> RecoveryReport {
        self.recovery
    }

    /// Returns the ring configuration.
    #[must_use]
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Returns the underlying storage.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Releases the underlying storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// The valid span as seen through the current header.
    pub(crate) fn span(&self) -> CoreResult<Span> {
        let content = self.storage.size()?;
        let Header {
            dirty_start,
            dirty_end,
            attempted,
        } = self.header;

        if attempted.is_some() && dirty_start == dirty_end {
            return Ok(Span::EMPTY);
        }
        if dirty_end < dirty_start {
            return Ok(Span {
                older: Segment::new(dirty_end, dirty_start),
                newer: None,
            });
        }
        Ok(Span {
            older: Segment::new(dirty_end.min(content), content),
            newer: Some(Segment::new(HEADER_SIZE, dirty_start.min(content))),
        })
    }

    /// Reads the record at `pos`, returning its payload and the next boundary.
    pub(crate) fn read_record(&self, pos: u64, limit: u64) -> CoreResult<(Vec<u8>, u64)> {
        let record = self.locate(pos, limit)?;
        let suffix = F::suffix_size(record.len);
        let mut bytes = self
            .storage
            .read_at(record.data_start, (record.len + suffix) as usize)?;
        if !F::suffix_matches(&bytes[record.len as usize..], record.len) {
            return Err(CoreError::corrupt_record(
                pos,
                "trailing length indicator does not match",
            ));
        }
        bytes.truncate(record.len as usize);
        Ok((bytes, record.end))
    }

    /// Finds the boundary after the record at `pos`.
    pub(crate) fn skip_record(&self, pos: u64, limit: u64) -> CoreResult<u64> {
        Ok(self.locate(pos, limit)?.end)
    }

    /// Decodes the forward indicator at `pos`; the record must end by `limit`.
    fn locate(&self, pos: u64, limit: u64) -> CoreResult<Located> {
        let window = limit.saturating_sub(pos).min(li::MAX_LI_SIZE as u64) as usize;
        let bytes = self.storage.read_at(pos, window)?;
        let indicator =
            li::decode_prefix(&bytes).map_err(|err| CoreError::corrupt_record(pos, err))?;

        let data_start = pos + indicator.width as u64;
        let end = data_start
            .checked_add(indicator.len)
            .and_then(|end| end.checked_add(F::suffix_size(indicator.len)))
            .filter(|end| *end <= limit)
            .ok_or_else(|| {
                CoreError::corrupt_record(
                    pos,
                    format!("record of {} bytes runs past {limit}", indicator.len),
                )
            })?;

        Ok(Located {
            start: pos,
            data_start,
            len: indicator.len,
            end,
        })
    }

    /// Walks records from `segment.start` until a boundary at or past
    /// `target`. Returns `None` if the segment ends first.
    fn first_boundary_from(&self, segment: Segment, target: u64) -> CoreResult<Option<u64>> {
        let mut pos = segment.start;
        while pos < target {
            if pos >= segment.end {
                return Ok(None);
            }
            pos = self.locate(pos, segment.end)?.end;
        }
        Ok(Some(pos))
    }

    fn repair_if_interrupted(&mut self) -> CoreResult<()> {
        if self.header.is_interrupted() {
            let header = self.header;
            self.recover(header)?;
        }
        Ok(())
    }

    /// Brings a stored header back to a committed state.
    fn recover(&mut self, stored: Header) -> CoreResult<RecoveryReport> {
        let content = self.storage.size()?;
        let (header, clamped) = stored.clamped(content);
        let mut report = RecoveryReport {
            clamped,
            interrupted: header.attempted,
            ..RecoveryReport::default()
        };
        if clamped {
            warn!(?stored, content, "clamped header offsets into storage bounds");
        }

        let Some(attempt) = header.attempted else {
            self.header = header;
            if clamped {
                self.write_header(header, "clamp")?;
            }
            return Ok(report);
        };

        warn!(
            start = attempt.start,
            end = attempt.end,
            "rolling back interrupted append"
        );
        if header.dirty_start == header.dirty_end {
            // the interrupted append had already evicted every older record
            self.clear()?;
            report.reset = true;
        } else {
            if header.dirty_end < header.dirty_start && content > header.dirty_start {
                self.storage.truncate(header.dirty_start)?;
            }
            let committed = Header::committed(header.dirty_start, header.dirty_end);
            self.write_header(committed, "recovery commit")?;
        }
        Ok(report)
    }

    fn write_header(&mut self, next: Header, step: &'static str) -> CoreResult<()> {
        trace!(
            step,
            dirty_start = next.dirty_start,
            dirty_end = next.dirty_end,
            attempted = ?next.attempted,
            "writing header"
        );
        self.storage.write_at(0, &[&next.encode()])?;
        if self.config.sync_on_commit {
            self.storage.sync()?;
        }
        self.header = next;
        Ok(())
    }
}

impl<S: StorageBackend> RingBuffer<S, Stack> {
    /// Deletes the newest record.
    ///
    /// Returns `Ok(false)` if the ring is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the newest record is corrupt.
    pub fn delete_last(&mut self) -> CoreResult<bool> {
        self.repair_if_interrupted()?;

        let span = self.span()?;
        let (segment, rest) = match span.newer_non_empty() {
            Some(newer) => (newer, Some(span.older).filter(|s| !s.is_empty())),
            None if !span.older.is_empty() => (span.older, None),
            None => return Ok(false),
        };

        let start = self.locate_backward(segment.end, segment.start)?.start;
        let dirty_start = if start > segment.start {
            Some(start)
        } else {
            rest.map(|_| segment.start)
        };

        match dirty_start {
            Some(dirty_start) => {
                let next_header = Header::committed(dirty_start, self.header.dirty_end);
                self.write_header(next_header, "delete last")?;
            }
            None => {
                debug!("last record deleted, clearing");
                self.clear()?;
            }
        }
        Ok(true)
    }

    /// Returns the newest record without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the record is corrupt.
    pub fn last(&self) -> CoreResult<Option<Vec<u8>>> {
        self.reverse_iter()?.next().transpose()
    }

    /// Iterates from the newest to the oldest record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage size cannot be read.
    pub fn reverse_iter(&self) -> CoreResult<ReverseElements<&Self>> {
        ReverseElements::new(self)
    }

    /// Reads the record ending at `end`, returning its payload and start.
    pub(crate) fn read_record_backward(
        &self,
        end: u64,
        lower: u64,
    ) -> CoreResult<(Vec<u8>, u64)> {
        let record = self.locate_backward(end, lower)?;
        let prefix_width = record.data_start - record.start;
        let mut bytes = self
            .storage
            .read_at(record.start, (prefix_width + record.len) as usize)?;

        match li::decode_prefix(&bytes) {
            Ok(indicator)
                if indicator.len == record.len && indicator.width as u64 == prefix_width => {}
            _ => {
                return Err(CoreError::corrupt_record(
                    record.start,
                    "leading length indicator does not match",
                ))
            }
        }
        bytes.drain(..prefix_width as usize);
        Ok((bytes, record.start))
    }

    /// Finds the boundary before the record ending at `end`.
    pub(crate) fn skip_record_backward(&self, end: u64, lower: u64) -> CoreResult<u64> {
        Ok(self.locate_backward(end, lower)?.start)
    }

    /// Decodes the reverse indicator ending at `end`; the record must start
    /// at or after `lower`.
    fn locate_backward(&self, end: u64, lower: u64) -> CoreResult<Located> {
        let window = end.saturating_sub(lower).min(li::MAX_LI_SIZE as u64);
        let bytes = self.storage.read_at(end - window, window as usize)?;
        let indicator =
            li::decode_suffix(&bytes).map_err(|err| CoreError::corrupt_record(end, err))?;

        let data_end = end - indicator.width as u64;
        let prefix_width = li::li_size(indicator.len) as u64;
        let start = data_end
            .checked_sub(indicator.len)
            .and_then(|data_start| data_start.checked_sub(prefix_width))
            .filter(|start| *start >= lower)
            .ok_or_else(|| {
                CoreError::corrupt_record(
                    end,
                    format!("record of {} bytes starts before {lower}", indicator.len),
                )
            })?;

        Ok(Located {
            start,
            data_start: start + prefix_width,
            len: indicator.len,
            end,
        })
    }
}

impl<S, F: Framing> std::fmt::Debug for RingBuffer<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("framing", &F::NAME)
            .field("config", &self.config)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}
