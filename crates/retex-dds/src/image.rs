//! Decoded DDS images.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use retex_common::{Metadata, PixelBuffer};
use tracing::debug;

use crate::block::DxtFormat;
use crate::decode::{decode_surface, DdsDecodeOptions, SurfaceLayout};
use crate::header::{DdsHeader, FourCC};
use crate::Result;

/// A decoded DDS texture (top-level surface only).
#[derive(Debug, Clone)]
pub struct DdsImage {
    header: DdsHeader,
    format: DxtFormat,
    buffer: PixelBuffer,
}

impl DdsImage {
    /// Decode a DDS file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &DdsDecodeOptions::default())
    }

    /// Decode a DDS file from disk with explicit options.
    pub fn open_with<P: AsRef<Path>>(path: P, options: &DdsDecodeOptions) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader_with(&mut reader, options)
    }

    /// Decode a DDS image held in memory, e.g. via `include_bytes!`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(&mut Cursor::new(data))
    }

    /// Decode a DDS image from a seekable stream positioned at the magic.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::from_reader_with(reader, &DdsDecodeOptions::default())
    }

    /// Decode a DDS image from a seekable stream with explicit options.
    ///
    /// The header is fully validated, and the stream checked to hold the whole
    /// top-level surface, before any pixel storage is allocated.
    pub fn from_reader_with<R: Read + Seek>(
        reader: &mut R,
        options: &DdsDecodeOptions,
    ) -> Result<Self> {
        let header = DdsHeader::read(reader)?;
        let format = header.format()?;
        let surface = SurfaceLayout::new(header.width(), header.height(), options.edges);

        let position = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;

        let needed = surface.compressed_size(format);
        let available = end.saturating_sub(position);
        if available < needed {
            return Err(retex_common::Error::Truncated {
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                available: usize::try_from(available).unwrap_or(usize::MAX),
            }
            .into());
        }

        debug!(
            ?format,
            width = surface.width,
            height = surface.height,
            blocks_x = surface.blocks_x,
            blocks_y = surface.blocks_y,
            "decoding DDS surface"
        );

        let buffer = decode_surface(reader, surface, format, options.row_order)?;

        Ok(Self {
            header,
            format,
            buffer,
        })
    }

    /// The parsed surface description.
    pub fn header(&self) -> &DdsHeader {
        &self.header
    }

    /// The block decoder that produced the pixels.
    pub fn format(&self) -> DxtFormat {
        self.format
    }

    /// The FourCC as stored in the file (DXT2/DXT4 are preserved here).
    pub fn four_cc(&self) -> FourCC {
        self.header.pixel_format.four_cc
    }

    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            width: self.buffer.width(),
            height: self.buffer.height(),
            layout: self.buffer.layout(),
            has_alpha: true,
            format: self.header.pixel_format.format_tag(),
        }
    }

    /// The decoded pixels, `Rgba8888`.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Take ownership of the decoded pixels.
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}
