//! Truevision TGA decoding.
//!
//! Supports indexed, true color and greyscale images, raw or run-length
//! encoded, at 8, 16, 24 and 32 bits per pixel. Version 2 footers are
//! recognized; their extension and developer areas are kept as opaque bytes.
//!
//! # Example
//!
//! ```no_run
//! use retex_tga::TgaImage;
//!
//! let image = TgaImage::open("path/to/image.tga")?;
//! println!("{}x{} {:?}", image.width(), image.height(), image.pixel_format());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Some exporters write a color map range into images without a color map.
//! [`validate_and_repair`] clears it in place.

mod decode;
mod error;
mod header;
mod image;
mod rle;
mod validate;

pub use decode::{build_palette, read_pixels};
pub use error::{Error, Result};
pub use header::{TgaFooter, TgaHeader, TgaVersion};
pub use image::{TgaImage, EXTENSION_AREA_SIZE};
pub use rle::RleReader;
pub use validate::{validate, validate_and_repair};
