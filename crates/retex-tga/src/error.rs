//! Error types for TGA handling.

use thiserror::Error;

/// Errors that can occur when validating or decoding TGA files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncated input, buffer addressing).
    #[error("{0}")]
    Common(#[from] retex_common::Error),

    /// Invalid TGA header.
    #[error("invalid TGA header: {0}")]
    InvalidHeader(String),

    /// Recognized but unsupported image type or depth.
    #[error("unsupported TGA format: {0}")]
    UnsupportedFormat(String),

    /// Indexed image without a color map.
    #[error("indexed TGA image has no color map")]
    MissingPalette,

    /// Color map holds more entries than the palette can address.
    #[error("color map entry {index} exceeds the {max} entry palette")]
    PaletteSizeMismatch { index: usize, max: usize },
}

impl Error {
    /// Whether the input ended before a record or pixel data was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_truncated())
    }

    /// Whether a structural header check failed.
    pub fn is_invalid_header(&self) -> bool {
        matches!(self, Error::InvalidHeader(_) | Error::MissingPalette)
    }
}

/// Result type for TGA operations.
pub type Result<T> = std::result::Result<T, Error>;
