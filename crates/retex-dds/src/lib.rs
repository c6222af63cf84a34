//! DDS texture decoding.
//!
//! Decodes the top-level surface of DirectDraw Surface files compressed with
//! S3TC (DXT1, DXT3, DXT5, and the premultiplied DXT2/DXT4) into an RGBA
//! [`PixelBuffer`](retex_common::PixelBuffer).
//!
//! Uncompressed RGB surfaces are recognized but not decoded.
//!
//! # Example
//!
//! ```no_run
//! use retex_dds::DdsImage;
//!
//! let image = DdsImage::open("path/to/texture.dds")?;
//! println!("{}x{} {:?}", image.width(), image.height(), image.format());
//! let rgba = image.buffer().to_rgba8();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod color;
mod decode;
mod error;
mod image;

pub mod block;
pub mod header;

pub use block::{DxtBlock, DxtFormat};
pub use color::{Color565, Color888, Color8888};
pub use decode::{DdsDecodeOptions, EdgePolicy};
pub use error::{Error, Result};
pub use header::{DdsCaps, DdsHeader, DdsPixelFormat, FourCC};
pub use image::DdsImage;

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
