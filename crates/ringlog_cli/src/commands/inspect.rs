//! Inspect command implementation.

use super::{CommandResult, OpenRing, RingTarget};
use ringlog_core::{Framing, Header, RecoveryReport, RingLog, HEADER_SIZE};
use ringlog_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header fields as shown to the user.
#[derive(Debug, Serialize)]
pub struct HeaderInfo {
    /// Write cursor.
    pub dirty_start: u64,
    /// Oldest record offset.
    pub dirty_end: u64,
    /// In-flight append range, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted: Option<(u64, u64)>,
}

impl From<Header> for HeaderInfo {
    fn from(header: Header) -> Self {
        Self {
            dirty_start: header.dirty_start,
            dirty_end: header.dirty_end,
            attempted: header.attempted.map(|a| (a.start, a.end)),
        }
    }
}

/// What recovery did on open.
#[derive(Debug, Serialize)]
pub struct RecoveryInfo {
    /// Storage was initialised.
    pub initialized: bool,
    /// Offsets were clamped into bounds.
    pub clamped: bool,
    /// An interrupted append was rolled back.
    pub rolled_back: bool,
    /// The ring was reset to empty.
    pub reset: bool,
}

impl From<RecoveryReport> for RecoveryInfo {
    fn from(report: RecoveryReport) -> Self {
        Self {
            initialized: report.initialized,
            clamped: report.clamped,
            rolled_back: report.interrupted.is_some(),
            reset: report.reset,
        }
    }
}

/// Ring inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Ring file path.
    pub path: String,
    /// Framing the ring was opened with.
    pub framing: &'static str,
    /// Header as stored before recovery ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_header: Option<HeaderInfo>,
    /// Header after recovery.
    pub header: HeaderInfo,
    /// Recovery actions.
    pub recovery: RecoveryInfo,
    /// Storage size in bytes.
    pub content_size: u64,
    /// Configured budget in bytes.
    pub max_size: u64,
    /// Number of records.
    pub record_count: usize,
    /// Budget not used by live records.
    pub free_bytes: u64,
    /// Largest element a single append accepts.
    pub max_element_size: u64,
}

/// Runs the inspect command.
pub fn run(target: &RingTarget, format: &str) -> CommandResult {
    target.require_existing()?;
    let stored_header = read_stored_header(&target.path)?;

    let mut result = match target.open()? {
        OpenRing::Queue(ring) => inspect(&ring)?,
        OpenRing::Stack(ring) => inspect(&ring)?,
    };
    result.path = target.path.display().to_string();
    result.max_size = target.max_size;
    result.stored_header = stored_header.map(HeaderInfo::from);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect<F: Framing>(ring: &RingLog<FileBackend, F>) -> CommandResult<InspectResult> {
    let (content_size, record_count) =
        ring.read_batch(|r| Ok::<_, Box<dyn std::error::Error>>((r.storage().size()?, r.len()?)))?;

    Ok(InspectResult {
        path: String::new(),
        framing: F::NAME,
        stored_header: None,
        header: ring.header().into(),
        recovery: ring.recovery().into(),
        content_size,
        max_size: 0,
        record_count,
        free_bytes: ring.free_space()?,
        max_element_size: ring.max_single_element_size(),
    })
}

/// Reads the header bytes without running recovery.
fn read_stored_header(path: &Path) -> CommandResult<Option<Header>> {
    let mut raw = [0u8; HEADER_SIZE as usize];
    let mut file = File::open(path)?;
    match file.read_exact(&mut raw) {
        Ok(()) => Ok(Some(Header::decode(&raw))),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn print_header(label: &str, header: &HeaderInfo) {
    print!(
        "  {label:<10} dirty_start={} dirty_end={}",
        header.dirty_start, header.dirty_end
    );
    if let Some((start, end)) = header.attempted {
        print!(" attempted={start}..{end}");
    }
    println!();
}

fn print_text_output(result: &InspectResult) {
    println!("ringlog Inspection");
    println!("==================");
    println!();
    println!("Path:    {}", result.path);
    println!("Framing: {}", result.framing);
    println!();
    println!("Header:");
    if let Some(stored) = &result.stored_header {
        print_header("stored", stored);
    }
    print_header("current", &result.header);
    println!();
    println!("Recovery:");
    println!("  Initialized: {}", result.recovery.initialized);
    println!("  Clamped:     {}", result.recovery.clamped);
    println!("  Rolled back: {}", result.recovery.rolled_back);
    println!("  Reset:       {}", result.recovery.reset);
    println!();
    println!("Storage:");
    println!("  Content size:     {}", format_size(result.content_size));
    println!("  Max size:         {}", format_size(result.max_size));
    println!("  Free:             {}", format_size(result.free_bytes));
    println!("  Max element size: {}", format_size(result.max_element_size));
    println!();
    println!("Records: {}", result.record_count);
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
