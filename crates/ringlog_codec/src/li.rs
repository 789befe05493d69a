//! Length indicators.
//!
//! ## Format
//!
//! ```text
//! forward:  | n (1) | len (n bytes, big-endian) |
//! reverse:  | len (n bytes, big-endian) | n (1) |
//! ```
//!
//! `n` is the minimal number of bytes needed to hold the length (0 for an
//! empty record), so a reader positioned on either end learns the indicator
//! width from a single byte.

use crate::error::{CodecError, CodecResult};

/// Largest number of length bytes a tag may announce.
pub const MAX_TAG: u8 = 8;

/// Largest encoded size of one length indicator.
pub const MAX_LI_SIZE: usize = 1 + MAX_TAG as usize;

/// A decoded length indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthIndicator {
    /// Encoded size of the indicator itself (tag plus length bytes).
    pub width: usize,
    /// The record length it announces.
    pub len: u64,
}

/// Number of big-endian bytes needed to hold `len`.
#[must_use]
pub const fn length_bytes(len: u64) -> usize {
    ((u64::BITS - len.leading_zeros()) as usize).div_ceil(8)
}

/// Encoded size of the indicator for a record of `len` bytes.
#[must_use]
pub const fn li_size(len: u64) -> usize {
    1 + length_bytes(len)
}

/// Encodes the forward (prefix) indicator for `len`.
#[must_use]
pub fn encode_prefix(len: u64) -> Vec<u8> {
    let n = length_bytes(len);
    let mut out = Vec::with_capacity(1 + n);
    out.push(n as u8);
    out.extend_from_slice(&len.to_be_bytes()[8 - n..]);
    out
}

/// Encodes the reverse (suffix) indicator for `len`.
#[must_use]
pub fn encode_suffix(len: u64) -> Vec<u8> {
    let n = length_bytes(len);
    let mut out = Vec::with_capacity(1 + n);
    out.extend_from_slice(&len.to_be_bytes()[8 - n..]);
    out.push(n as u8);
    out
}

/// Decodes a forward indicator from the start of `bytes`.
///
/// `bytes` may extend past the indicator; only the announced width is read.
///
/// # Errors
///
/// Returns an error if `bytes` is too short or the tag is out of range.
pub fn decode_prefix(bytes: &[u8]) -> CodecResult<LengthIndicator> {
    let tag = *bytes.first().ok_or(CodecError::UnexpectedEof {
        needed: 1,
        available: 0,
    })?;
    let n = check_tag(tag)?;
    if bytes.len() < 1 + n {
        return Err(CodecError::UnexpectedEof {
            needed: 1 + n,
            available: bytes.len(),
        });
    }
    Ok(LengthIndicator {
        width: 1 + n,
        len: be_to_u64(&bytes[1..1 + n]),
    })
}

/// Decodes a reverse indicator from the end of `bytes`.
///
/// `bytes` may start before the indicator; only the announced width is read.
///
/// # Errors
///
/// Returns an error if `bytes` is too short or the tag is out of range.
pub fn decode_suffix(bytes: &[u8]) -> CodecResult<LengthIndicator> {
    let tag = *bytes.last().ok_or(CodecError::UnexpectedEof {
        needed: 1,
        available: 0,
    })?;
    let n = check_tag(tag)?;
    if bytes.len() < 1 + n {
        return Err(CodecError::UnexpectedEof {
            needed: 1 + n,
            available: bytes.len(),
        });
    }
    let end = bytes.len() - 1;
    Ok(LengthIndicator {
        width: 1 + n,
        len: be_to_u64(&bytes[end - n..end]),
    })
}

fn check_tag(tag: u8) -> CodecResult<usize> {
    if tag > MAX_TAG {
        return Err(CodecError::InvalidTag { tag, max: MAX_TAG });
    }
    Ok(tag as usize)
}

fn be_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}
