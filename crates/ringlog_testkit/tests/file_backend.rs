//! File-backed ring tests.

use ringlog_core::{CoreError, Header, RingConfig, WriteAttempt, HEADER_SIZE};
use ringlog_storage::{FileBackend, StorageError};
use ringlog_testkit::prelude::*;

#[test]
fn stack_persists_across_reopen() {
    let file = temp_ring_file();
    let config = RingConfig::new().max_size(HEADER_SIZE + 48).sync_on_commit(true);

    let expected = {
        let stack = file.open_stack(config.clone());
        for i in 0..30u8 {
            stack.push(&[i; 4]).unwrap();
        }
        stack.pop().unwrap();
        stack.read_batch(contents).unwrap()
    };

    let stack = file.open_stack(config);
    assert!(stack.recovery().is_clean());
    assert_eq!(stack.read_batch(contents).unwrap(), expected);
    assert_eq!(stack.peek_last().unwrap(), Some(vec![28; 4]));
}

#[test]
fn second_open_is_locked() {
    let file = temp_ring_file();
    let _queue = file.open_queue(RingConfig::new());
    assert!(matches!(
        FileBackend::open(file.path()),
        Err(StorageError::Locked)
    ));
}

#[test]
fn lock_error_surfaces_through_ring() {
    let file = temp_ring_file();
    let _held = file.backend();
    let second = FileBackend::open(file.path()).map_err(CoreError::from);
    assert!(matches!(second, Err(CoreError::Storage(StorageError::Locked))));
}

#[test]
fn interrupted_append_on_disk_is_rolled_back() {
    let file = temp_ring_file();
    let config = RingConfig::new().max_size(1024);
    {
        let queue = file.open_queue(config.clone());
        queue.enqueue(b"alpha").unwrap();
        queue.enqueue(b"beta").unwrap();
    }

    let mut bytes = file.bytes();
    let committed_end = bytes.len() as u64;
    let attempt = WriteAttempt {
        start: committed_end,
        end: committed_end + 10,
    };
    let pending = Header::pending(committed_end, HEADER_SIZE, attempt);
    bytes[..HEADER_SIZE as usize].copy_from_slice(&pending.encode());
    bytes.extend_from_slice(&[1, 8, b'g', b'a', b'm']);
    file.set_bytes(&bytes);

    let queue = file.open_queue(config);
    assert_eq!(queue.recovery().interrupted, Some(attempt));
    assert_eq!(
        queue.read_batch(contents).unwrap(),
        vec![b"alpha".to_vec(), b"beta".to_vec()]
    );
    drop(queue);
    assert_eq!(file.bytes().len() as u64, committed_end);
}

#[test]
fn oversized_file_shrinks_after_wrapping() {
    let file = temp_ring_file();
    {
        let queue = file.open_queue(RingConfig::new().max_size(1024));
        for i in 0..150u8 {
            queue.enqueue(&[i; 4]).unwrap();
        }
    }
    assert!(file.bytes().len() > 512);

    let config = RingConfig::new().max_size(HEADER_SIZE + 96);
    let queue = file.open_queue(config);
    assert!(queue.recovery().is_clean());
    assert_eq!(queue.first().unwrap(), Some(vec![0; 4]));

    for i in 0..60u8 {
        queue.enqueue(&[i; 4]).unwrap();
    }
    let records = queue.read_batch(contents).unwrap();
    assert_eq!(records.last(), Some(&vec![59; 4]));
    drop(queue);
    assert!(file.bytes().len() as u64 <= HEADER_SIZE + 96);
}

#[test]
fn clear_shrinks_file_to_header() {
    let file = temp_ring_file();
    let queue = file.open_queue(RingConfig::new());
    queue.enqueue(b"data").unwrap();
    queue.clear().unwrap();
    assert!(queue.is_empty().unwrap());
    drop(queue);
    assert_eq!(file.bytes(), Header::empty().encode().to_vec());
}
