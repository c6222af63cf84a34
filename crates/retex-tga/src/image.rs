//! Decoded TGA images.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use retex_common::{Metadata, Palette, PixelBuffer, PixelFormatTag, ReadExt};
use tracing::{debug, warn};

use crate::decode::{build_palette, read_pixels};
use crate::header::{TgaFooter, TgaHeader, TgaVersion};
use crate::rle::RleReader;
use crate::{Error, Result};

/// Size of the version 2 extension area.
pub const EXTENSION_AREA_SIZE: usize = 495;

/// A decoded TGA image.
#[derive(Debug, Clone)]
pub struct TgaImage {
    header: TgaHeader,
    footer: Option<TgaFooter>,
    image_id: Vec<u8>,
    extension_area: Option<Vec<u8>>,
    trailing: Vec<u8>,
    buffer: PixelBuffer,
}

impl TgaImage {
    /// Decode a TGA file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader(&mut reader)
    }

    /// Decode a TGA image held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(&mut Cursor::new(data))
    }

    /// Decode a TGA image from a seekable stream positioned at the header.
    ///
    /// Offsets in a version 2 footer are taken relative to that position.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let header: TgaHeader = reader.read_record()?;
        header.check()?;
        let layout = header.layout()?;

        let color_map_bytes = if header.has_color_map() {
            header.color_map_bytes()
        } else {
            0
        };

        // Raw pixel data has a known size, so a short file fails before allocating.
        let mut needed = header.id_length as u64 + color_map_bytes as u64;
        if !header.is_compressed() {
            needed += (header.width() * header.height() * layout.bytes_per_pixel()) as u64;
        }
        let available = end.saturating_sub(start + TgaHeader::SIZE as u64);
        if available < needed {
            return Err(retex_common::Error::Truncated {
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                available: usize::try_from(available).unwrap_or(usize::MAX),
            }
            .into());
        }

        let footer = read_footer(reader, start, end)?;

        debug!(
            image_type = header.image_type,
            bits = header.bits_per_pixel,
            width = header.width(),
            height = header.height(),
            compressed = header.is_compressed(),
            version = ?footer.map_or(TgaVersion::V1, |_| TgaVersion::V2),
            "decoding TGA image"
        );

        let image_id = reader.read_bytes_exact(header.id_length as usize)?;
        let color_map = reader.read_bytes_exact(color_map_bytes)?;
        let palette = build_palette(&header, &color_map)?;

        let mut buffer = if header.is_compressed() {
            let mut rle = RleReader::new(&mut *reader, layout.bytes_per_pixel());
            read_pixels(&mut rle, &header, layout)?
        } else {
            read_pixels(reader, &header, layout)?
        };

        if let Some(palette) = palette {
            buffer.set_palette(palette);
        }

        let (extension_area, trailing) = match &footer {
            Some(footer) => read_extras(reader, footer, start, end)?,
            None => (None, Vec::new()),
        };

        Ok(Self {
            header,
            footer,
            image_id,
            extension_area,
            trailing,
            buffer,
        })
    }

    pub fn header(&self) -> &TgaHeader {
        &self.header
    }

    /// The footer of a version 2 file.
    pub fn footer(&self) -> Option<&TgaFooter> {
        self.footer.as_ref()
    }

    pub fn version(&self) -> TgaVersion {
        if self.footer.is_some() {
            TgaVersion::V2
        } else {
            TgaVersion::V1
        }
    }

    pub fn pixel_format(&self) -> PixelFormatTag {
        self.header.pixel_format()
    }

    pub fn is_compressed(&self) -> bool {
        self.header.is_compressed()
    }

    pub fn bottom_to_top(&self) -> bool {
        self.header.bottom_to_top()
    }

    /// Whether the file stores columns right to left. Column order in the
    /// decoded buffer is left to right regardless.
    pub fn right_to_left(&self) -> bool {
        self.header.right_to_left()
    }

    pub fn alpha_bits(&self) -> u8 {
        self.header.alpha_bits()
    }

    /// The palette of an 8-bit image.
    pub fn palette(&self) -> Option<&Palette> {
        self.buffer.palette()
    }

    /// The image ID field, uninterpreted.
    pub fn image_id(&self) -> &[u8] {
        &self.image_id
    }

    /// The version 2 extension area, uninterpreted.
    pub fn extension_area(&self) -> Option<&[u8]> {
        self.extension_area.as_deref()
    }

    /// Bytes between the last area read and the footer of a version 2 file.
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.trailing
    }

    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    pub fn metadata(&self) -> Metadata {
        let layout = self.buffer.layout();
        Metadata {
            width: self.buffer.width(),
            height: self.buffer.height(),
            layout,
            has_alpha: layout.has_alpha() && self.header.alpha_bits() > 0,
            format: self.header.pixel_format(),
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

/// Read the footer from the last bytes of the stream, restoring the position.
fn read_footer<R: Read + Seek>(reader: &mut R, start: u64, end: u64) -> Result<Option<TgaFooter>> {
    if end.saturating_sub(start) < TgaFooter::SIZE as u64 {
        return Ok(None);
    }

    let position = reader.stream_position()?;
    reader.seek(SeekFrom::Start(end - TgaFooter::SIZE as u64))?;
    let footer: TgaFooter = reader.read_record()?;
    reader.seek(SeekFrom::Start(position))?;

    Ok(footer.is_valid().then_some(footer))
}

/// Read the opaque areas of a version 2 file that follow the pixel data.
fn read_extras<R: Read + Seek>(
    reader: &mut R,
    footer: &TgaFooter,
    start: u64,
    end: u64,
) -> Result<(Option<Vec<u8>>, Vec<u8>)> {
    let footer_start = end - TgaFooter::SIZE as u64;

    let in_file = |name: &str, offset: u32| -> Option<u64> {
        if offset == 0 {
            return None;
        }
        let position = start + offset as u64;
        if position > footer_start {
            warn!(offset, footer_start, "TGA {} offset points past the footer", name);
            return None;
        }
        Some(position)
    };

    let developer = in_file("developer directory", footer.developer_directory_offset.get());
    let extension = in_file("extension area", footer.extension_area_offset.get());

    if let Some(position) = extension.or(developer) {
        reader.seek(SeekFrom::Start(position))?;
    }

    let extension_area = match extension {
        Some(position) => {
            if position + EXTENSION_AREA_SIZE as u64 > footer_start {
                return Err(Error::InvalidHeader(format!(
                    "extension area at {} overlaps the footer",
                    position - start
                )));
            }
            Some(reader.read_bytes_exact(EXTENSION_AREA_SIZE)?)
        }
        None => None,
    };

    let position = reader.stream_position()?;
    let trailing = reader.read_bytes_exact(footer_start.saturating_sub(position) as usize)?;

    Ok((extension_area, trailing))
}

#[cfg(test)]
mod tests {
    use zerocopy::IntoBytes;

    use retex_common::{Color, PixelLayout};

    use super::*;
    use crate::header::tests::{footer, header, with_color_map};

    fn tga_bytes(header: &TgaHeader, body: &[u8]) -> Vec<u8> {
        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_greyscale_end_to_end() {
        let data = tga_bytes(&header(3, 8, 2, 1), &[0x00, 0xFF]);
        let image = TgaImage::from_bytes(&data).unwrap();

        assert_eq!(image.version(), TgaVersion::V1);
        assert_eq!(image.pixel_format(), PixelFormatTag::Greyscale);
        let palette = image.palette().unwrap();
        for i in 0..=255u8 {
            assert_eq!(palette.get(i), Color::rgb(i, i, i));
        }
        assert_eq!(
            image.buffer().to_rgba8(),
            vec![0, 0, 0, 255, 255, 255, 255, 255]
        );
    }

    #[test]
    fn test_indexed_with_image_id() {
        let mut h = with_color_map(header(1, 8, 1, 1), 2, 24);
        h.id_length = 3;
        let mut body = b"abc".to_vec();
        body.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
        body.push(1);

        let image = TgaImage::from_bytes(&tga_bytes(&h, &body)).unwrap();
        assert_eq!(image.image_id(), b"abc");
        assert_eq!(image.metadata().layout, PixelLayout::Indexed8);
        assert_eq!(image.buffer().to_rgba8(), vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_true_color_with_stray_color_map() {
        // Non-indexed images skip any color map they declare.
        let h = with_color_map(header(2, 24, 1, 1), 1, 24);
        let data = tga_bytes(&h, &[9, 9, 9, 0x01, 0x02, 0x03]);

        let image = TgaImage::from_bytes(&data).unwrap();
        assert!(image.palette().is_none());
        assert_eq!(image.buffer().pixel(0, 0).unwrap(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_rle_true_color() {
        let mut h = header(10, 32, 3, 1);
        h.descriptor = 0x28;
        let data = tga_bytes(&h, &[0x82, 0x10, 0x20, 0x30, 0x40]);

        let image = TgaImage::from_bytes(&data).unwrap();
        assert!(image.is_compressed());
        let meta = image.metadata();
        assert_eq!(meta.layout, PixelLayout::Bgra8888);
        assert!(meta.has_alpha);
        assert_eq!(
            image.buffer().to_rgba8(),
            [0x30u8, 0x20, 0x10, 0x40].repeat(3)
        );
    }

    #[test]
    fn test_raw_data_checked_before_decode() {
        let data = tga_bytes(&header(2, 24, 4, 4), &[0u8; 10]);
        let err = TgaImage::from_bytes(&data).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_truncated_rle_stream() {
        let data = tga_bytes(&header(10, 24, 4, 4), &[0x81, 1, 2, 3]);
        assert!(TgaImage::from_bytes(&data).unwrap_err().is_truncated());
    }

    #[test]
    fn test_version_two_with_extension_area() {
        let h = header(3, 8, 1, 1);
        let mut data = tga_bytes(&h, &[0x80]);
        data.extend_from_slice(&[0xD0, 0xD1]);
        let extension_offset = data.len() as u32;
        data.extend(std::iter::repeat(0xEE).take(EXTENSION_AREA_SIZE));
        data.extend_from_slice(&[0xAB, 0xCD]);
        data.extend_from_slice(footer(extension_offset, 0).as_bytes());

        let image = TgaImage::from_bytes(&data).unwrap();
        assert_eq!(image.version(), TgaVersion::V2);
        let extension = image.extension_area().unwrap();
        assert_eq!(extension.len(), EXTENSION_AREA_SIZE);
        assert!(extension.iter().all(|&b| b == 0xEE));
        assert_eq!(image.trailing_bytes(), &[0xAB, 0xCD]);
    }

    #[test]
    fn test_version_two_keeps_bytes_after_pixels() {
        let h = header(3, 8, 1, 1);
        let mut data = tga_bytes(&h, &[0x80, 1, 2, 3]);
        data.extend_from_slice(footer(0, 0).as_bytes());

        let image = TgaImage::from_bytes(&data).unwrap();
        assert_eq!(image.version(), TgaVersion::V2);
        assert!(image.extension_area().is_none());
        assert_eq!(image.trailing_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_offset_past_footer_is_ignored() {
        let h = header(3, 8, 1, 1);
        let mut data = tga_bytes(&h, &[0x80]);
        data.extend_from_slice(footer(10_000, 10_000).as_bytes());

        let image = TgaImage::from_bytes(&data).unwrap();
        assert!(image.extension_area().is_none());
        assert!(image.trailing_bytes().is_empty());
    }

    #[test]
    fn test_extension_area_overlapping_footer() {
        let h = header(3, 8, 1, 1);
        let mut data = tga_bytes(&h, &[0x80]);
        let extension_offset = data.len() as u32;
        data.extend_from_slice(&[0u8; 100]);
        data.extend_from_slice(footer(extension_offset, 0).as_bytes());

        let err = TgaImage::from_bytes(&data).unwrap_err();
        assert!(err.is_invalid_header());
    }

    #[test]
    fn test_short_stream_is_version_one() {
        let data = tga_bytes(&header(3, 8, 1, 1), &[7]);
        assert!(data.len() < TgaFooter::SIZE);
        let image = TgaImage::from_bytes(&data).unwrap();
        assert_eq!(image.version(), TgaVersion::V1);
        assert!(image.trailing_bytes().is_empty());
    }

    #[test]
    fn test_unsupported_image_type() {
        let data = tga_bytes(&header(4, 24, 1, 1), &[0; 3]);
        assert!(matches!(
            TgaImage::from_bytes(&data),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
