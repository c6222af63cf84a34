//! Error type for format-agnostic decoding.

use thiserror::Error;

/// Errors from [`decode_file`](crate::decode_file) and friends.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while opening or sniffing the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DDS decoding failed.
    #[error("DDS: {0}")]
    Dds(#[from] retex_dds::Error),

    /// TGA decoding failed.
    #[error("TGA: {0}")]
    Tga(#[from] retex_tga::Error),
}

impl Error {
    pub fn is_truncated(&self) -> bool {
        match self {
            Error::Io(_) => false,
            Error::Dds(e) => e.is_truncated(),
            Error::Tga(e) => e.is_truncated(),
        }
    }

    pub fn is_invalid_header(&self) -> bool {
        match self {
            Error::Io(_) => false,
            Error::Dds(e) => e.is_invalid_header(),
            Error::Tga(e) => e.is_invalid_header(),
        }
    }
}

/// Result type for format-agnostic decoding.
pub type Result<T> = std::result::Result<T, Error>;
