//! Offset-addressed binary buffers for the FBE wire format.
//!
//! Every field of an FBE payload lives at an offset relative to a *base
//! offset*, so an embedded struct can be encoded with the same 0-relative
//! field offsets as a top-level one. The two buffer types in this crate
//! carry that base and perform the only relative-to-absolute arithmetic.
//!
//! # Overview
//!
//! - [`WriteBuffer`] - Owns a growable byte region with a bump allocator
//! - [`ReadBuffer`] - Immutable, `Copy` view over already-received bytes
//! - [`Decimal`] - 96-bit decimal with its 16-byte wire layout
//! - [`BufferConfig`] - Capacity settings for write buffers
//!
//! All multi-byte quantities are little-endian.
//!
//! # Example
//!
//! ```
//! use fbe_buffers::{ReadBuffer, WriteBuffer};
//!
//! let mut writer = WriteBuffer::new();
//! let at = writer.allocate(8).unwrap();
//! writer.write_i32(at, -7).unwrap();
//! writer.write_u32(at + 4, 0x0102_0304).unwrap();
//!
//! let reader = ReadBuffer::new(writer.data());
//! assert_eq!(reader.read_i32(0).unwrap(), -7);
//! assert_eq!(reader.read_u32(4).unwrap(), 0x0102_0304);
//! ```

mod config;
mod decimal;
mod print_octets;
mod read_buffer;
mod write_buffer;

pub use config::BufferConfig;
pub use decimal::{Decimal, MAX_DECIMAL_MAGNITUDE, MAX_DECIMAL_SCALE};
pub use print_octets::{hex, print_octets};
pub use read_buffer::ReadBuffer;
pub use uuid::Uuid;
pub use write_buffer::WriteBuffer;

use thiserror::Error;

/// Size in bytes of every length, count and pointer prefix on the wire.
pub const PREFIX_SIZE: usize = 4;

/// Error type for buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A byte range does not fit in the buffer.
    #[error("range of {length} bytes at offset {offset} is outside the buffer (size {size})")]
    OutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },
    /// Growth would exceed the configured capacity limit.
    #[error("requested capacity {requested} exceeds the limit of {limit} bytes")]
    CapacityExceeded { requested: usize, limit: usize },
    /// A length or count prefix claims more bytes than remain.
    #[error("length prefix {length} exceeds the {available} remaining bytes")]
    InvalidLength { length: usize, available: usize },
    /// Invalid UTF-8 sequence.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    /// Wide char that is not a Unicode scalar value.
    #[error("invalid code point {0:#x}")]
    InvalidChar(u32),
    /// Malformed UUID text.
    #[error("invalid UUID `{0}`")]
    InvalidUuid(String),
    /// Decimal scale outside 0..=28.
    #[error("invalid decimal scale {0}, expected 0..=28")]
    InvalidDecimalScale(u32),
    /// Decimal magnitude that does not fit in 96 bits.
    #[error("decimal magnitude does not fit in 96 bits")]
    DecimalOverflow,
    /// Malformed decimal text or wire bytes.
    #[error("invalid decimal `{0}`")]
    InvalidDecimal(String),
}

/// Parses the RFC 4122 textual form of a UUID.
///
/// ```
/// use fbe_buffers::parse_uuid;
///
/// let id = parse_uuid("123e4567-e89b-12d3-a456-426655440000").unwrap();
/// assert_eq!(id.as_bytes()[0], 0x12);
/// assert!(parse_uuid("not-a-uuid").is_err());
/// ```
pub fn parse_uuid(text: &str) -> Result<Uuid, BufferError> {
    // Only the hyphenated 36-character form travels in FBE text payloads.
    if text.len() != 36 {
        return Err(BufferError::InvalidUuid(text.to_owned()));
    }
    Uuid::parse_str(text).map_err(|_| BufferError::InvalidUuid(text.to_owned()))
}
