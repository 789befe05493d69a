//! # ringlog Codec
//!
//! Length-indicator (LI) framing for ringlog records.
//!
//! Every record in a ring is framed by a self-describing length indicator so
//! that a reader standing on a record boundary can find the next boundary
//! without an index. The double-linked ring also writes a mirrored indicator
//! after the payload, which lets a reader walk backwards.
//!
//! ## Usage
//!
//! ```
//! use ringlog_codec::li;
//!
//! let prefix = li::encode_prefix(300);
//! let decoded = li::decode_prefix(&prefix).unwrap();
//! assert_eq!(decoded.len, 300);
//! assert_eq!(decoded.width, prefix.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod li;

pub use error::{CodecError, CodecResult};
pub use li::{LengthIndicator, MAX_LI_SIZE};
