//! Error types for DDS handling.

use thiserror::Error;

/// Errors that can occur when decoding DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncated input, buffer addressing).
    #[error("{0}")]
    Common(#[from] retex_common::Error),

    /// Invalid DDS magic.
    #[error("invalid DDS magic: expected 'DDS ', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Invalid DDS header.
    #[error("invalid DDS header: {0}")]
    InvalidHeader(String),

    /// Recognized but unimplemented surface format.
    #[error("unsupported DDS format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Whether the input ended before a header or block was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_truncated())
    }

    /// Whether a magic, size or flag check on the header failed.
    pub fn is_invalid_header(&self) -> bool {
        matches!(self, Error::InvalidMagic(_) | Error::InvalidHeader(_))
    }
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
