//! Record framing strategies.
//!
//! A ring is generic over how records are framed:
//!
//! - [`Queue`]: `LI(len) || payload`, forward traversal only
//! - [`Stack`]: `LI(len) || payload || ReverseLI(len)`, both directions
//!
//! The framing decides the per-record overhead; the reverse operations of
//! the ring are only implemented for `Stack`.

use ringlog_codec::li;

/// How records are framed inside the ring.
pub trait Framing: Send + Sync + 'static {
    /// Human-readable name, used in logs and tooling.
    const NAME: &'static str;

    /// Size of the trailing indicator for a record of `len` bytes.
    fn suffix_size(len: u64) -> u64;

    /// Encodes the trailing indicator for a record of `len` bytes.
    fn encode_suffix(len: u64) -> Vec<u8>;

    /// Checks that `suffix` is the trailing indicator of a `len`-byte record.
    fn suffix_matches(suffix: &[u8], len: u64) -> bool;

    /// Total framing bytes added to a record of `len` bytes.
    fn overhead(len: u64) -> u64 {
        li::li_size(len) as u64 + Self::suffix_size(len)
    }

    /// Largest payload whose framed size fits in `space` bytes.
    ///
    /// The overhead grows with the encoded length, so each indicator width is
    /// tried and the largest fitting length wins. Returns `None` if not even
    /// an empty record fits.
    fn max_payload(space: u64) -> Option<u64> {
        (0..=li::MAX_TAG as u32).rev().find_map(|width| {
            let lowest = if width == 0 { 0 } else { 1u64 << (8 * (width - 1)) };
            let highest = if width == 8 {
                u64::MAX
            } else {
                (1u64 << (8 * width)) - 1
            };
            let room = space.checked_sub(Self::overhead(lowest))?;
            (room >= lowest).then(|| room.min(highest))
        })
    }
}

/// Forward-only framing used by the queue ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Queue;

impl Framing for Queue {
    const NAME: &'static str = "queue";

    fn suffix_size(_len: u64) -> u64 {
        0
    }

    fn encode_suffix(_len: u64) -> Vec<u8> {
        Vec::new()
    }

    fn suffix_matches(suffix: &[u8], _len: u64) -> bool {
        suffix.is_empty()
    }
}

/// Double-linked framing used by the stack ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stack;

impl Framing for Stack {
    const NAME: &'static str = "stack";

    fn suffix_size(len: u64) -> u64 {
        li::li_size(len) as u64
    }

    fn encode_suffix(len: u64) -> Vec<u8> {
        li::encode_suffix(len)
    }

    fn suffix_matches(suffix: &[u8], len: u64) -> bool {
        matches!(li::decode_suffix(suffix), Ok(decoded) if decoded.len == len && decoded.width == suffix.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overheads() {
        assert_eq!(Queue::overhead(0), 1);
        assert_eq!(Queue::overhead(3), 2);
        assert_eq!(Queue::overhead(300), 3);
        assert_eq!(Stack::overhead(0), 2);
        assert_eq!(Stack::overhead(3), 4);
        assert_eq!(Stack::overhead(300), 6);
    }

    #[test]
    fn max_payload_fits_exactly() {
        for space in [1u64, 2, 11, 100, 257, 258, 259, 65_538, 65_539, 1 << 20] {
            let len = Queue::max_payload(space).unwrap();
            assert!(len + Queue::overhead(len) <= space, "space {space}");
            assert!(
                len + 1 + Queue::overhead(len + 1) > space,
                "space {space} could hold {}",
                len + 1
            );
        }
    }

    #[test]
    fn max_payload_at_width_boundary() {
        // 256 needs a two-byte length, so 258 bytes only hold a 255-byte payload
        assert_eq!(Queue::max_payload(258), Some(255));
        assert_eq!(Queue::max_payload(259), Some(256));
        assert_eq!(Stack::max_payload(259), Some(255));
    }

    #[test]
    fn max_payload_too_small() {
        assert_eq!(Queue::max_payload(0), None);
        assert_eq!(Stack::max_payload(1), None);
        assert_eq!(Stack::max_payload(2), Some(0));
    }

    #[test]
    fn stack_suffix_check() {
        let suffix = Stack::encode_suffix(300);
        assert!(Stack::suffix_matches(&suffix, 300));
        assert!(!Stack::suffix_matches(&suffix, 301));
        assert!(Queue::suffix_matches(&[], 5));
    }
}
