//! Error types for retex-common.

use thiserror::Error;

/// Common error type for retex operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended before a fixed-size record or data block was complete.
    #[error("truncated input: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },

    /// Invalid magic bytes encountered.
    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// A pixel address fell outside the buffer.
    #[error("pixel ({row}, {col}) is outside a {width}x{height} buffer")]
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    /// Palette has more entries than an 8-bit index can address.
    #[error("palette holds at most {max} entries, got {actual}")]
    PaletteTooLarge { max: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error reports input that ended early.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
