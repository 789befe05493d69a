//! The persistent ring header.
//!
//! ## Layout
//!
//! ```text
//! | dirty_start (8) | dirty_end (8) | attempted_start (8) | attempted_end (8) |
//! ```
//!
//! All fields are big-endian `i64`. The attempted range is `-1, -1` unless an
//! append is in flight.
//!
//! ## Valid span
//!
//! Records are read from `dirty_end` up to `dirty_start`, wrapping once from
//! the content end back to [`HEADER_SIZE`]:
//!
//! - `dirty_end < dirty_start`: valid is `[dirty_end, dirty_start)`
//! - `dirty_end > dirty_start`: valid is `[dirty_end, content) + [HEADER_SIZE, dirty_start)`
//! - equal, committed: the whole content is valid (empty when content is just the header)
//! - equal, pre-committed: nothing survived the eviction of the in-flight append

/// Size of the header; all record data lives at or after this offset.
pub const HEADER_SIZE: u64 = 32;

const NONE: i64 = -1;

/// The byte range an in-flight append is about to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAttempt {
    /// First byte of the attempted write.
    pub start: u64,
    /// One past the last byte of the attempted write.
    pub end: u64,
}

/// A snapshot of the ring header.
///
/// Headers are plain values: every protocol step builds the next header and
/// writes it as a whole, the ring never patches fields in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Offset where the next write begins (end of the valid span).
    pub dirty_start: u64,
    /// Offset of the oldest record (start of the valid span).
    pub dirty_end: u64,
    /// Range of an append that has been pre-committed but not committed.
    pub attempted: Option<WriteAttempt>,
}

impl Header {
    /// The header of an empty ring.
    #[must_use]
    pub const fn empty() -> Self {
        Self::committed(HEADER_SIZE, HEADER_SIZE)
    }

    /// A header with no write in flight.
    #[must_use]
    pub const fn committed(dirty_start: u64, dirty_end: u64) -> Self {
        Self {
            dirty_start,
            dirty_end,
            attempted: None,
        }
    }

    /// A pre-commit header announcing `attempt`.
    #[must_use]
    pub const fn pending(dirty_start: u64, dirty_end: u64, attempt: WriteAttempt) -> Self {
        Self {
            dirty_start,
            dirty_end,
            attempted: Some(attempt),
        }
    }

    /// Returns `true` if an append was interrupted between pre-commit and commit.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.attempted.is_some()
    }

    /// Encodes the header into its on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let (attempt_start, attempt_end) = match self.attempted {
            Some(a) => (to_field(a.start), to_field(a.end)),
            None => (NONE, NONE),
        };
        let mut out = [0u8; HEADER_SIZE as usize];
        out[0..8].copy_from_slice(&to_field(self.dirty_start).to_be_bytes());
        out[8..16].copy_from_slice(&to_field(self.dirty_end).to_be_bytes());
        out[16..24].copy_from_slice(&attempt_start.to_be_bytes());
        out[24..32].copy_from_slice(&attempt_end.to_be_bytes());
        out
    }

    /// Decodes a header from its on-disk form.
    ///
    /// Negative offsets (other than the sentinel) decode as zero; the ring
    /// clamps every offset during recovery, so foreign bytes never fail here.
    #[must_use]
    pub fn decode(bytes: &[u8; HEADER_SIZE as usize]) -> Self {
        let field = |i: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            i64::from_be_bytes(raw)
        };
        let (attempt_start, attempt_end) = (field(2), field(3));
        let attempted = if attempt_start == NONE && attempt_end == NONE {
            None
        } else {
            Some(WriteAttempt {
                start: from_field(attempt_start),
                end: from_field(attempt_end),
            })
        };
        Self {
            dirty_start: from_field(field(0)),
            dirty_end: from_field(field(1)),
            attempted,
        }
    }

    /// Clamps both dirty offsets into `[HEADER_SIZE, content]`.
    ///
    /// Returns the clamped header and whether anything changed.
    #[must_use]
    pub fn clamped(self, content: u64) -> (Self, bool) {
        let upper = content.max(HEADER_SIZE);
        let clamped = Self {
            dirty_start: self.dirty_start.clamp(HEADER_SIZE, upper),
            dirty_end: self.dirty_end.clamp(HEADER_SIZE, upper),
            attempted: self.attempted,
        };
        (clamped, clamped != self)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::empty()
    }
}

fn to_field(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

fn from_field(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
