//! retex - decoding of legacy raster image containers.
//!
//! This crate ties the format crates together behind one entry point.
//!
//! # Crates
//!
//! - [`retex_common`] - Record codec, pixel buffers, palettes
//! - [`retex_dds`] - DDS decoding (DXT1/DXT3/DXT5)
//! - [`retex_tga`] - TGA decoding, validation and header repair
//!
//! # Example
//!
//! ```no_run
//! use retex::prelude::*;
//!
//! let image = retex::decode_file("texture.dds")?;
//! let meta = image.metadata();
//! println!("{:?} {}x{} {:?}", image.kind(), meta.width, meta.height, meta.layout);
//! let rgba = image.to_rgba8();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod error;

pub use retex_common as common;
pub use retex_dds as dds;
pub use retex_tga as tga;

pub use decode::{
    decode_bytes, decode_file, decode_file_with, decode_reader, decode_reader_with, DecodedImage,
    ImageKind,
};
pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{DecodedImage, ImageKind};
    pub use retex_common::{
        Color, Metadata, Palette, PixelBuffer, PixelFormatTag, PixelLayout, RowOrder,
    };
    pub use retex_dds::{DdsDecodeOptions, DdsImage, DxtFormat, EdgePolicy};
    pub use retex_tga::{validate, validate_and_repair, TgaImage, TgaVersion};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
