//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use ringlog_core::{Framing, RingConfig, RingLog};
use ringlog_storage::InMemoryBackend;

/// Generate random element data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate elements with random sizes up to `max_size`.
pub fn random_elements(count: usize, max_size: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_data(rng.gen_range(0..=max_size)))
        .collect()
}

/// Opens an in-memory ring and appends `element_size`-byte elements until it
/// has wrapped at least once.
pub fn filled_ring<F: Framing>(max_size: u64, element_size: usize) -> RingLog<InMemoryBackend, F> {
    let ring = RingLog::open(InMemoryBackend::new(), RingConfig::new().max_size(max_size))
        .expect("Failed to open ring");
    let data = random_data(element_size);
    let appends = 2 * max_size as usize / (element_size + 1) + 1;
    for _ in 0..appends {
        ring.enqueue(&data).expect("Failed to append");
    }
    ring
}
