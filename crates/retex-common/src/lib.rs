//! Common utilities for retex.
//!
//! This crate provides the foundational types shared by the DDS and TGA decoders:
//!
//! - [`ReadExt`] / [`WriteExt`] - Fixed-layout record codec over `std::io` streams
//! - [`PixelBuffer`] - Owned, stride-aligned destination for decoded pixels
//! - [`PixelLayout`], [`RowOrder`] - Byte layout and physical row order of a buffer
//! - [`Palette`], [`Color`] - Color tables for 8-bit images
//! - [`Metadata`], [`PixelFormatTag`] - What downstream consumers need to display a buffer

mod error;
mod palette;
mod pixel;
mod reader;

pub use error::{Error, Result};
pub use palette::{Color, Palette};
pub use pixel::{Metadata, PixelBuffer, PixelFormatTag, PixelLayout, RowOrder};
pub use reader::{ReadExt, WriteExt};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Re-export zerocopy's little-endian integer wrappers used in record layouts.
pub use zerocopy::byteorder::little_endian;
