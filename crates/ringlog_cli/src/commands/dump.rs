//! Dump command implementation.

use super::{render, CommandResult, OpenRing, RingTarget};
use ringlog_core::{CoreResult, Framing, RingLog};
use ringlog_storage::FileBackend;
use serde::Serialize;

/// A record as shown to the user.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordInfo {
    /// Position in iteration order.
    pub index: usize,
    /// Payload size in bytes.
    pub len: usize,
    /// Payload as text, or hex when not printable.
    pub value: String,
}

/// Runs the dump command.
pub fn run(target: &RingTarget, limit: Option<usize>, reverse: bool, format: &str) -> CommandResult {
    target.require_existing()?;
    let limit = limit.unwrap_or(usize::MAX);

    let records = match target.open()? {
        OpenRing::Queue(_) if reverse => {
            return Err("--reverse needs a ring opened with --stack".into());
        }
        OpenRing::Queue(ring) => forward(&ring, limit)?,
        OpenRing::Stack(ring) if reverse => describe(ring.reverse_iter()?, limit)?,
        OpenRing::Stack(ring) => forward(&ring, limit)?,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records, reverse);
        }
    }

    Ok(())
}

fn forward<F: Framing>(ring: &RingLog<FileBackend, F>, limit: usize) -> CoreResult<Vec<RecordInfo>> {
    describe(ring.iter()?, limit)
}

fn describe(
    records: impl Iterator<Item = CoreResult<Vec<u8>>>,
    limit: usize,
) -> CoreResult<Vec<RecordInfo>> {
    records
        .take(limit)
        .enumerate()
        .map(|(index, record)| {
            record.map(|bytes| RecordInfo {
                index,
                len: bytes.len(),
                value: render(&bytes),
            })
        })
        .collect()
}

fn print_text_output(records: &[RecordInfo], reverse: bool) {
    let order = if reverse { "newest first" } else { "oldest first" };
    println!("Records ({} shown, {order})", records.len());
    println!("================");
    println!();

    for record in records {
        println!("[{:06}] {:>6} bytes  {}", record.index, record.len, record.value);
    }
}
