//! Crash recovery testing for ringlog.
//!
//! This module simulates a process dying in the middle of a ring operation
//! and verifies that reopening the storage recovers a consistent ring.
//!
//! ## Test Strategy
//!
//! 1. Dry-run an append on a [`CrashableBackend`] to learn every mutating
//!    storage call it makes (wrap truncation, pre-commit, element write, commit)
//! 2. Replay the append once per [`CrashPoint`], failing that call and, for
//!    element writes, letting a prefix of the bytes land first
//! 3. Reopen the surviving bytes and check the recovered records against the
//!    states before and after the append
//!
//! ## Usage
//!
//! ```rust
//! use ringlog_core::{Queue, RingConfig, HEADER_SIZE};
//! use ringlog_testkit::crash::CrashRecoveryHarness;
//!
//! let harness = CrashRecoveryHarness::new(RingConfig::new().max_size(HEADER_SIZE + 11))
//!     .with_initial([&b"1"[..], b"22"]);
//! for result in harness.check_append::<Queue>(b"333").unwrap() {
//!     assert!(result.passed, "{result:?}");
//! }
//! ```

use crate::generators::RingOp;
use ringlog_core::{
    CoreResult, Framing, Queue, RecoveryReport, RingBuffer, RingConfig, Stack, HEADER_SIZE,
};
use ringlog_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};

/// A mutating storage call, as recorded by [`CrashableBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// A positional write.
    Write {
        /// Offset of the write.
        offset: u64,
        /// Total bytes written.
        len: usize,
    },
    /// A range deletion.
    DeleteRange {
        /// Start of the deleted range.
        from: u64,
        /// End of the deleted range.
        to: u64,
    },
    /// A tail truncation.
    Truncate {
        /// Size after truncation.
        new_size: u64,
    },
    /// A whole-content replacement.
    Replace {
        /// Size after replacement.
        len: usize,
    },
}

impl Mutation {
    /// Returns `true` for writes into the record area, which may tear.
    #[must_use]
    pub fn is_record_write(&self) -> bool {
        matches!(self, Self::Write { offset, .. } if *offset >= HEADER_SIZE)
    }
}

/// Where a simulated crash strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashPoint {
    /// Zero-based index of the mutating call that fails.
    pub mutation: usize,
    /// Bytes of a failing record write that reach storage before the crash.
    pub torn: usize,
}

impl CrashPoint {
    /// Fails the given mutation without applying any of it.
    #[must_use]
    pub const fn at(mutation: usize) -> Self {
        Self { mutation, torn: 0 }
    }

    /// Fails the given write after `bytes` of it have landed.
    #[must_use]
    pub const fn torn(mutation: usize, bytes: usize) -> Self {
        Self {
            mutation,
            torn: bytes,
        }
    }
}

/// A storage backend wrapper that can simulate crashes.
///
/// Once the armed call fails, every later mutation fails too, as a dead
/// process would write nothing more. Reads keep working so the surviving
/// bytes can be inspected.
#[derive(Debug)]
pub struct CrashableBackend<B = InMemoryBackend> {
    inner: B,
    crash_at: Option<CrashPoint>,
    log: Vec<Mutation>,
    crashed: bool,
}

impl<B: StorageBackend> CrashableBackend<B> {
    /// Wraps `inner` without arming a crash.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            crash_at: None,
            log: Vec::new(),
            crashed: false,
        }
    }

    /// Wraps `inner`, crashing at `point`.
    pub fn with_crash(inner: B, point: CrashPoint) -> Self {
        let mut backend = Self::new(inner);
        backend.arm(point);
        backend
    }

    /// Arms a crash at `point`, counted from the creation of the backend.
    pub fn arm(&mut self, point: CrashPoint) {
        self.crash_at = Some(point);
    }

    /// Returns every mutating call attempted so far, including the failed one.
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Returns whether the backend has crashed.
    pub fn has_crashed(&self) -> bool {
        self.crashed
    }

    /// Returns the wrapped backend.
    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Records `mutation` and returns the armed crash if it strikes now.
    fn begin(&mut self, mutation: Mutation) -> StorageResult<Option<CrashPoint>> {
        if self.crashed {
            return Err(crash_error("storage unavailable after simulated crash"));
        }
        let index = self.log.len();
        self.log.push(mutation);
        match self.crash_at {
            Some(point) if point.mutation == index => {
                self.crashed = true;
                Ok(Some(point))
            }
            _ => Ok(None),
        }
    }
}

fn crash_error(message: &str) -> StorageError {
    StorageError::Io(std::io::Error::other(message.to_string()))
}

impl<B: StorageBackend> StorageBackend for CrashableBackend<B> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn write_at(&mut self, offset: u64, parts: &[&[u8]]) -> StorageResult<()> {
        let len = parts.iter().map(|p| p.len()).sum();
        let Some(point) = self.begin(Mutation::Write { offset, len })? else {
            return self.inner.write_at(offset, parts);
        };
        let torn = point.torn.min(len);
        if torn > 0 {
            let bytes = parts.concat();
            self.inner.write_at(offset, &[&bytes[..torn]])?;
        }
        Err(crash_error("simulated crash during write"))
    }

    fn delete_range(&mut self, from: u64, to: u64) -> StorageResult<()> {
        match self.begin(Mutation::DeleteRange { from, to })? {
            None => self.inner.delete_range(from, to),
            Some(_) => Err(crash_error("simulated crash during delete")),
        }
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        match self.begin(Mutation::Replace { len: data.len() })? {
            None => self.inner.replace(data),
            Some(_) => Err(crash_error("simulated crash during replace")),
        }
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        match self.begin(Mutation::Truncate { new_size })? {
            None => self.inner.truncate(new_size),
            Some(_) => Err(crash_error("simulated crash during truncate")),
        }
    }
}

/// Result of a single crash recovery check.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Where the crash struck.
    pub point: CrashPoint,
    /// The mutation that failed, if the crash struck at all.
    pub mutation: Option<Mutation>,
    /// Whether the recovered state was acceptable.
    pub passed: bool,
    /// Records after recovery.
    pub recovered: Vec<Vec<u8>>,
    /// What recovery reported on the first reopen.
    pub report: RecoveryReport,
    /// Why the check failed.
    pub error: Option<String>,
}

/// Framings the harness can drive through a [`RingOp`] history.
pub trait HistoryFraming: Framing + Sized {
    /// Deletes the newest record, or returns `None` if the framing only
    /// reads forward.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the newest record is corrupt.
    fn delete_last<S: StorageBackend>(ring: &mut RingBuffer<S, Self>) -> CoreResult<Option<bool>>;

    /// Reads every record newest first, or returns `None` if the framing
    /// only reads forward.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or a record is corrupt.
    fn newest_first<S: StorageBackend>(ring: &RingBuffer<S, Self>) -> CoreResult<Option<Vec<Vec<u8>>>>;
}

impl HistoryFraming for Queue {
    fn delete_last<S: StorageBackend>(_ring: &mut RingBuffer<S, Self>) -> CoreResult<Option<bool>> {
        Ok(None)
    }

    fn newest_first<S: StorageBackend>(_ring: &RingBuffer<S, Self>) -> CoreResult<Option<Vec<Vec<u8>>>> {
        Ok(None)
    }
}

impl HistoryFraming for Stack {
    fn delete_last<S: StorageBackend>(ring: &mut RingBuffer<S, Self>) -> CoreResult<Option<bool>> {
        ring.delete_last().map(Some)
    }

    fn newest_first<S: StorageBackend>(ring: &RingBuffer<S, Self>) -> CoreResult<Option<Vec<Vec<u8>>>> {
        ring.reverse_iter()?.collect::<CoreResult<_>>().map(Some)
    }
}

/// Runs appends against every crash point and verifies recovery.
///
/// The starting ring is built by replaying a history of operations, so
/// deletions and reopens can shape the layout the crashing append sees.
#[derive(Debug, Clone)]
pub struct CrashRecoveryHarness {
    config: RingConfig,
    history: Vec<RingOp>,
}

impl CrashRecoveryHarness {
    /// Creates a harness starting from an empty ring.
    pub fn new(config: RingConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
        }
    }

    /// Appends `elements` to the starting ring.
    #[must_use]
    pub fn with_initial<I, E>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        self.history.extend(
            elements
                .into_iter()
                .map(|e| RingOp::Append(e.as_ref().to_vec())),
        );
        self
    }

    /// Replays `ops` on the starting ring.
    ///
    /// `DeleteLast` is skipped on queues.
    #[must_use]
    pub fn with_history(mut self, ops: impl IntoIterator<Item = RingOp>) -> Self {
        self.history.extend(ops);
        self
    }

    /// Builds the ring every crashing append starts from.
    ///
    /// # Errors
    ///
    /// Returns an error if a replayed operation fails.
    pub fn starting_ring<F: HistoryFraming>(&self) -> CoreResult<RingBuffer<InMemoryBackend, F>> {
        let mut ring = RingBuffer::open(InMemoryBackend::new(), self.config.clone())?;
        for op in &self.history {
            match op {
                RingOp::Append(element) => {
                    ring.append(element)?;
                }
                RingOp::DeleteFirst => {
                    ring.delete_first()?;
                }
                RingOp::DeleteLast => {
                    F::delete_last(&mut ring)?;
                }
                RingOp::Clear => ring.clear()?,
                RingOp::Reopen => {
                    let data = ring.into_storage().data();
                    ring = RingBuffer::open(InMemoryBackend::with_data(data), self.config.clone())?;
                }
            }
        }
        Ok(ring)
    }

    /// Builds the starting storage and returns its bytes and records.
    fn prepare<F: HistoryFraming>(&self) -> CoreResult<(Vec<u8>, Vec<Vec<u8>>)> {
        let ring = self.starting_ring::<F>()?;
        let records = records(&ring)?;
        Ok((ring.into_storage().data(), records))
    }

    /// Lists every crash point of appending `element`.
    ///
    /// Each mutating call is failed outright; record writes are also torn
    /// after one byte and one byte short of complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the uncrashed append fails.
    pub fn crash_points<F: HistoryFraming>(&self, element: &[u8]) -> CoreResult<Vec<CrashPoint>> {
        let (data, _) = self.prepare::<F>()?;
        let mut ring: RingBuffer<_, F> = RingBuffer::open(
            CrashableBackend::new(InMemoryBackend::with_data(data)),
            self.config.clone(),
        )?;
        ring.append(element)?;

        let mut points = Vec::new();
        for (index, mutation) in ring.storage().mutations().iter().enumerate() {
            points.push(CrashPoint::at(index));
            if let Mutation::Write { len, .. } = mutation {
                if mutation.is_record_write() && *len > 1 {
                    points.push(CrashPoint::torn(index, 1));
                    points.push(CrashPoint::torn(index, len - 1));
                }
            }
        }
        Ok(points)
    }

    /// Appends `element`, crashing at `point`, then reopens the surviving
    /// bytes twice and checks the recovered records.
    ///
    /// # Errors
    ///
    /// Returns an error if preparing or reopening the ring fails.
    pub fn run<F: HistoryFraming>(&self, element: &[u8], point: CrashPoint) -> CoreResult<CrashRecoveryResult> {
        let (data, before) = self.prepare::<F>()?;

        let mut expected: RingBuffer<_, F> =
            RingBuffer::open(InMemoryBackend::with_data(data.clone()), self.config.clone())?;
        expected.append(element)?;
        let after = records(&expected)?;

        let mut ring: RingBuffer<_, F> = RingBuffer::open(
            CrashableBackend::with_crash(InMemoryBackend::with_data(data), point),
            self.config.clone(),
        )?;
        let appended = ring.append(element);
        let backend = ring.into_storage();
        let mutation = backend
            .has_crashed()
            .then(|| backend.mutations().last().copied())
            .flatten();
        let surviving = backend.into_inner().data();

        let recovered_ring: RingBuffer<_, F> =
            RingBuffer::open(InMemoryBackend::with_data(surviving), self.config.clone())?;
        let report = recovered_ring.recovery();
        let recovered = records(&recovered_ring)?;
        let backward = F::newest_first(&recovered_ring)?.map(|mut newest| {
            newest.reverse();
            newest
        });
        let recovered_header = recovered_ring.header();

        let reopened: RingBuffer<_, F> = RingBuffer::open(
            InMemoryBackend::with_data(recovered_ring.into_storage().data()),
            self.config.clone(),
        )?;

        let error = if mutation.is_none() && appended.is_err() {
            Some("append failed without a crash".to_string())
        } else if !acceptable(&before, &after, &recovered) {
            Some(format!(
                "recovered {} records, not a valid state between {} and {}",
                recovered.len(),
                before.len(),
                after.len()
            ))
        } else if backward.is_some_and(|backward| backward != recovered) {
            Some("backward traversal disagrees with forward traversal".to_string())
        } else if !reopened.recovery().is_clean() {
            Some("second recovery still found work to do".to_string())
        } else if reopened.header() != recovered_header {
            Some("second recovery changed the header".to_string())
        } else if records(&reopened)? != recovered {
            Some("second recovery changed the records".to_string())
        } else {
            None
        };

        Ok(CrashRecoveryResult {
            point,
            mutation,
            passed: error.is_none(),
            recovered,
            report,
            error,
        })
    }

    /// Runs [`Self::run`] for every point of [`Self::crash_points`], plus a
    /// point past the last mutation where the append completes.
    ///
    /// # Errors
    ///
    /// Returns an error if preparing or reopening a ring fails.
    pub fn check_append<F: HistoryFraming>(&self, element: &[u8]) -> CoreResult<Vec<CrashRecoveryResult>> {
        let mut points = self.crash_points::<F>(element)?;
        let past_end = points.iter().map(|p| p.mutation + 1).max().unwrap_or(0);
        points.push(CrashPoint::at(past_end));
        points
            .into_iter()
            .map(|point| self.run::<F>(element, point))
            .collect()
    }
}

/// Whether `recovered` is the appended state, or a suffix of the state before
/// the append that keeps everything the append keeps.
fn acceptable(before: &[Vec<u8>], after: &[Vec<u8>], recovered: &[Vec<u8>]) -> bool {
    if recovered == after {
        return true;
    }
    let kept = &after[..after.len().saturating_sub(1)];
    before.ends_with(recovered) && recovered.ends_with(kept)
}

fn records<S: StorageBackend, F: Framing>(ring: &RingBuffer<S, F>) -> CoreResult<Vec<Vec<u8>>> {
    ring.iter()?.collect()
}
