//! Commands that change the ring.

use super::{render, CommandResult, OpenRing, RingTarget};
use tracing::info;

/// Appends `value` as the newest record.
pub fn append(target: &RingTarget, value: &str) -> CommandResult {
    let accepted = match target.open()? {
        OpenRing::Queue(ring) => ring.enqueue(value.as_bytes())?,
        OpenRing::Stack(ring) => ring.push(value.as_bytes())?,
    };
    if !accepted {
        return Err(format!(
            "value of {} bytes exceeds the largest element this ring can hold",
            value.len()
        )
        .into());
    }
    info!(len = value.len(), "appended");
    Ok(())
}

/// Removes and prints the oldest record.
pub fn dequeue(target: &RingTarget) -> CommandResult {
    target.require_existing()?;
    let record = match target.open()? {
        OpenRing::Queue(ring) => ring.dequeue()?,
        OpenRing::Stack(ring) => ring.dequeue()?,
    };
    print_removed(record);
    Ok(())
}

/// Removes and prints the newest record.
pub fn pop(target: &RingTarget) -> CommandResult {
    target.require_existing()?;
    let OpenRing::Stack(ring) = target.open()? else {
        return Err("pop needs a ring opened with --stack".into());
    };
    print_removed(ring.pop()?);
    Ok(())
}

/// Resets the ring to empty.
pub fn clear(target: &RingTarget) -> CommandResult {
    target.require_existing()?;
    match target.open()? {
        OpenRing::Queue(ring) => ring.clear()?,
        OpenRing::Stack(ring) => ring.clear()?,
    }
    info!(path = %target.path.display(), "ring cleared");
    Ok(())
}

fn print_removed(record: Option<Vec<u8>>) {
    match record {
        Some(bytes) => println!("{}", render(&bytes)),
        None => println!("(empty)"),
    }
}
