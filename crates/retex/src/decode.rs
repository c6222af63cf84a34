//! Format detection and unified decoding.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use retex_common::{Metadata, PixelBuffer};
use retex_dds::{DdsDecodeOptions, DdsImage, DDS_MAGIC};
use retex_tga::TgaImage;
use tracing::debug;

use crate::Result;

/// Container format of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Dds,
    Tga,
}

impl ImageKind {
    /// Sniff the format from the first bytes of a file.
    ///
    /// TGA has no magic number, so anything that is not DDS is assumed to be TGA.
    pub fn detect(prefix: &[u8]) -> Self {
        if prefix.starts_with(DDS_MAGIC) {
            ImageKind::Dds
        } else {
            ImageKind::Tga
        }
    }

    /// Sniff the format at the current stream position, restoring it afterwards.
    pub fn detect_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match reader.read(&mut prefix[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        reader.seek(SeekFrom::Start(start))?;
        Ok(Self::detect(&prefix[..filled]))
    }

    /// Conventional file extensions for the format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageKind::Dds => &["dds"],
            ImageKind::Tga => &["tga", "vda", "icb", "vst"],
        }
    }
}

/// A decoded image of either format.
#[derive(Debug, Clone)]
pub enum DecodedImage {
    Dds(DdsImage),
    Tga(TgaImage),
}

impl DecodedImage {
    pub fn kind(&self) -> ImageKind {
        match self {
            DecodedImage::Dds(_) => ImageKind::Dds,
            DecodedImage::Tga(_) => ImageKind::Tga,
        }
    }

    pub fn metadata(&self) -> Metadata {
        match self {
            DecodedImage::Dds(image) => image.metadata(),
            DecodedImage::Tga(image) => image.metadata(),
        }
    }

    pub fn width(&self) -> usize {
        self.buffer().width()
    }

    pub fn height(&self) -> usize {
        self.buffer().height()
    }

    pub fn buffer(&self) -> &PixelBuffer {
        match self {
            DecodedImage::Dds(image) => image.buffer(),
            DecodedImage::Tga(image) => image.buffer(),
        }
    }

    pub fn into_buffer(self) -> PixelBuffer {
        match self {
            DecodedImage::Dds(image) => image.into_buffer(),
            DecodedImage::Tga(image) => image.into_buffer(),
        }
    }

    /// Tightly packed, top-down RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.buffer().to_rgba8()
    }
}

/// Decode an image file, detecting its format.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    decode_file_with(path, &DdsDecodeOptions::default())
}

/// Decode an image file with explicit DDS options.
pub fn decode_file_with<P: AsRef<Path>>(
    path: P,
    options: &DdsDecodeOptions,
) -> Result<DecodedImage> {
    let mut reader = BufReader::new(File::open(path)?);
    decode_reader_with(&mut reader, options)
}

/// Decode an image held in memory, e.g. an embedded resource.
pub fn decode_bytes(data: &[u8]) -> Result<DecodedImage> {
    decode_reader(&mut Cursor::new(data))
}

/// Decode an image from a seekable stream.
pub fn decode_reader<R: Read + Seek>(reader: &mut R) -> Result<DecodedImage> {
    decode_reader_with(reader, &DdsDecodeOptions::default())
}

/// Decode an image from a seekable stream with explicit DDS options.
pub fn decode_reader_with<R: Read + Seek>(
    reader: &mut R,
    options: &DdsDecodeOptions,
) -> Result<DecodedImage> {
    let kind = ImageKind::detect_reader(reader)?;
    debug!(?kind, "detected image format");

    Ok(match kind {
        ImageKind::Dds => DecodedImage::Dds(DdsImage::from_reader_with(reader, options)?),
        ImageKind::Tga => DecodedImage::Tga(TgaImage::from_reader(reader)?),
    })
}
