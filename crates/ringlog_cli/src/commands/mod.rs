//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod mutate;

use ringlog_core::{RingConfig, RingQueue, RingStack};
use ringlog_storage::FileBackend;
use std::path::PathBuf;

/// Result type shared by the commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Where the ring lives and how to open it.
#[derive(Debug, Clone)]
pub struct RingTarget {
    /// Ring file path.
    pub path: PathBuf,
    /// Storage budget in bytes.
    pub max_size: u64,
    /// Open with stack framing.
    pub stack: bool,
}

impl RingTarget {
    fn config(&self) -> RingConfig {
        RingConfig::new().max_size(self.max_size).sync_on_commit(true)
    }

    /// Fails unless the ring file already exists.
    pub fn require_existing(&self) -> CommandResult {
        if !self.path.exists() {
            return Err(format!("No ring found at {:?}", self.path).into());
        }
        Ok(())
    }

    /// Opens the ring, running recovery.
    pub fn open(&self) -> CommandResult<OpenRing> {
        let backend = FileBackend::open_with_create_dirs(&self.path)?;
        let ring = if self.stack {
            OpenRing::Stack(RingStack::open(backend, self.config())?)
        } else {
            OpenRing::Queue(RingQueue::open(backend, self.config())?)
        };
        Ok(ring)
    }
}

/// A ring opened with either framing.
pub enum OpenRing {
    /// Queue framing.
    Queue(RingQueue<FileBackend>),
    /// Stack framing.
    Stack(RingStack<FileBackend>),
}

/// Renders a payload as text when it is printable UTF-8, hex otherwise.
pub fn render(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("0x{}", hex_encode(bytes)),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
