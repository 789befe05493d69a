//! Test fixtures and ring helpers.
//!
//! Provides convenience functions for setting up rings over memory or a
//! temporary file, and for reading their contents back.

use ringlog_core::{
    CoreResult, Framing, Queue, RingBuffer, RingConfig, RingLog, RingQueue, RingStack, Stack,
    HEADER_SIZE,
};
use ringlog_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Opens an in-memory queue with the given budget.
pub fn memory_queue(max_size: u64) -> RingQueue<InMemoryBackend> {
    RingQueue::open(InMemoryBackend::new(), RingConfig::new().max_size(max_size))
        .expect("Failed to open in-memory queue")
}

/// Opens an in-memory stack with the given budget.
pub fn memory_stack(max_size: u64) -> RingStack<InMemoryBackend> {
    RingStack::open(InMemoryBackend::new(), RingConfig::new().max_size(max_size))
        .expect("Failed to open in-memory stack")
}

/// Reopens a memory-backed ring from its current bytes, running recovery.
pub fn reopen_memory<F: Framing>(
    ring: RingLog<InMemoryBackend, F>,
    config: RingConfig,
) -> RingLog<InMemoryBackend, F> {
    let data = ring.into_storage().data();
    RingLog::open(InMemoryBackend::with_data(data), config).expect("Failed to reopen ring")
}

/// Reads every record, oldest first.
pub fn contents<S: StorageBackend, F: Framing>(ring: &RingBuffer<S, F>) -> CoreResult<Vec<Vec<u8>>> {
    ring.iter()?.collect()
}

/// Reads every record, newest first.
pub fn reverse_contents<S: StorageBackend>(ring: &RingBuffer<S, Stack>) -> CoreResult<Vec<Vec<u8>>> {
    ring.reverse_iter()?.collect()
}

/// A ring file in a temporary directory, removed on drop.
pub struct TempRingFile {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TempRingFile {
    /// Returns the ring file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a file backend on the ring file.
    pub fn backend(&self) -> FileBackend {
        FileBackend::open(&self.path).expect("Failed to open ring file")
    }

    /// Opens a queue on the ring file.
    pub fn open_queue(&self, config: RingConfig) -> RingQueue<FileBackend> {
        RingQueue::open(self.backend(), config).expect("Failed to open file queue")
    }

    /// Opens a stack on the ring file.
    pub fn open_stack(&self, config: RingConfig) -> RingStack<FileBackend> {
        RingStack::open(self.backend(), config).expect("Failed to open file stack")
    }

    /// Returns the raw file bytes.
    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).expect("Failed to read ring file")
    }

    /// Overwrites the raw file bytes.
    pub fn set_bytes(&self, bytes: &[u8]) {
        std::fs::write(&self.path, bytes).expect("Failed to write ring file");
    }
}

/// Creates a path for a ring file in a fresh temporary directory.
///
/// The file itself is created by the first open.
pub fn temp_ring_file() -> TempRingFile {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    TempRingFile {
        path: temp_dir.path().join("ring.log"),
        _temp_dir: temp_dir,
    }
}

/// A record as the model places it in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelRecord {
    start: u64,
    end: u64,
    element: Vec<u8>,
}

/// Reference model of a ring's records and where they sit.
///
/// The model keeps its own write cursor and the byte range of every record,
/// so it predicts exactly which records an append evicts: those it
/// physically overwrites, plus everything past the write cursor on
/// wraparound. Nothing is read back from the ring.
#[derive(Debug, Clone)]
pub struct RingModel<F = Queue> {
    max_size: u64,
    write_cursor: u64,
    records: VecDeque<ModelRecord>,
    _framing: PhantomData<F>,
}

impl<F: Framing> RingModel<F> {
    /// Creates an empty model of a ring with the given budget.
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            write_cursor: HEADER_SIZE,
            records: VecDeque::new(),
            _framing: PhantomData,
        }
    }

    /// Appends `element`, evicting what the ring would evict.
    ///
    /// Returns `false` if the ring rejects the element as too large.
    pub fn append(&mut self, element: Vec<u8>) -> bool {
        let len = element.len() as u64;
        if len > F::max_payload(self.max_size - HEADER_SIZE).unwrap_or(0) {
            return false;
        }

        let framed = F::overhead(len) + len;
        let start = if self.write_cursor + framed > self.max_size {
            // the tail past the cursor is cut off before restarting
            let cursor = self.write_cursor;
            self.records.retain(|r| r.start < cursor);
            HEADER_SIZE
        } else {
            self.write_cursor
        };
        let end = start + framed;

        while self
            .records
            .front()
            .is_some_and(|r| r.start < end && r.end > start)
        {
            self.records.pop_front();
        }
        self.records.push_back(ModelRecord { start, end, element });
        self.write_cursor = end;
        true
    }

    /// Removes the oldest record.
    pub fn delete_first(&mut self) -> Option<Vec<u8>> {
        let record = self.records.pop_front()?;
        if self.records.is_empty() {
            self.clear();
        }
        Some(record.element)
    }

    /// Removes the newest record.
    pub fn delete_last(&mut self) -> Option<Vec<u8>> {
        let record = self.records.pop_back()?;
        self.write_cursor = record.start;
        if self.records.is_empty() {
            self.clear();
        }
        Some(record.element)
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.write_cursor = HEADER_SIZE;
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the model holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns where the next append starts unless it wraps.
    pub fn write_cursor(&self) -> u64 {
        self.write_cursor
    }

    /// Returns the records, oldest first.
    pub fn elements(&self) -> Vec<Vec<u8>> {
        self.records.iter().map(|r| r.element.clone()).collect()
    }
}
