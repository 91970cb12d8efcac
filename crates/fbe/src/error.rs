//! Engine error type.

use fbe_buffers::BufferError;
use thiserror::Error;

/// Error type for encoding and decoding operations.
///
/// Every error aborts the encode or decode call in progress; no partial
/// value is ever returned. A transport should drop the offending message
/// and keep the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FbeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("invalid optional flag {0:#04x}")]
    InvalidFlag(u8),
    #[error("null pointer for a present value")]
    NullPointer,
    #[error("struct size {size} is smaller than the {required} bytes of its header and fields")]
    InvalidStructSize { size: usize, required: usize },
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
}

/// Coarse classification of [`FbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A range outside the buffer, or growth past the capacity limit.
    Bounds,
    /// A fixed-cardinality array with the wrong element count.
    SizeMismatch,
    /// Malformed bytes or text: lengths, UTF-8, UUIDs, decimals, flags.
    Format,
    /// A value that does not match the declared field type.
    TypeMismatch,
    /// An invalid schema definition.
    Schema,
}

impl FbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FbeError::Buffer(BufferError::OutOfBounds { .. })
            | FbeError::Buffer(BufferError::CapacityExceeded { .. }) => ErrorKind::Bounds,
            FbeError::Buffer(_)
            | FbeError::InvalidFlag(_)
            | FbeError::NullPointer
            | FbeError::InvalidStructSize { .. } => ErrorKind::Format,
            FbeError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            FbeError::TypeMismatch { .. } | FbeError::UnknownField(_) => ErrorKind::TypeMismatch,
            FbeError::DuplicateField(_) => ErrorKind::Schema,
        }
    }

    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        FbeError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
