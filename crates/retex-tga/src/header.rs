//! TGA header and footer records.

use retex_common::little_endian::{I16, U32};
use retex_common::{PixelFormatTag, PixelLayout};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// Image types above this value are run-length encoded.
const RLE_IMAGE_TYPE_OFFSET: u8 = 8;

/// The 18-byte TGA file header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(C)]
pub struct TgaHeader {
    /// Length of the image ID field following the header.
    pub id_length: u8,
    /// 0 = no color map, 1 = color map present.
    pub color_map_type: u8,
    /// 1 indexed, 2 true color, 3 greyscale; +8 for RLE.
    pub image_type: u8,
    /// First color map entry.
    pub color_map_start: I16,
    /// Number of color map entries.
    pub color_map_length: I16,
    /// Bits per color map entry (15, 16, 24, 32).
    pub color_map_bits: u8,
    pub x_origin: I16,
    pub y_origin: I16,
    pub width: I16,
    pub height: I16,
    /// Bits per pixel (8, 16, 24, 32).
    pub bits_per_pixel: u8,
    /// Alpha bit count (bits 0-3) and origin flags (bits 4-5).
    pub descriptor: u8,
}

/// The 26-byte footer closing a version 2 file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(C)]
pub struct TgaFooter {
    pub extension_area_offset: U32,
    pub developer_directory_offset: U32,
    pub signature: [u8; 16],
    /// Must be `'.'`.
    pub reserved: u8,
    /// Must be zero.
    pub terminator: u8,
}

const _: () = assert!(std::mem::size_of::<TgaHeader>() == TgaHeader::SIZE);
const _: () = assert!(std::mem::size_of::<TgaFooter>() == TgaFooter::SIZE);

/// TGA file format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TgaVersion {
    /// No footer; header, image ID, color map and pixels only.
    V1,
    /// Signed footer; may carry extension and developer areas.
    V2,
}

impl TgaHeader {
    pub const SIZE: usize = 18;

    /// Color model, with the RLE offset removed.
    pub fn pixel_format(&self) -> PixelFormatTag {
        let base = if self.is_compressed() {
            self.image_type - RLE_IMAGE_TYPE_OFFSET
        } else {
            self.image_type
        };

        match base {
            1 => PixelFormatTag::Indexed,
            2 => PixelFormatTag::TrueColor,
            3 => PixelFormatTag::Greyscale,
            _ => PixelFormatTag::Unknown,
        }
    }

    /// Whether pixel data is run-length encoded.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.image_type > RLE_IMAGE_TYPE_OFFSET
    }

    #[inline]
    pub fn has_color_map(&self) -> bool {
        self.color_map_type == 1
    }

    /// Rows are stored starting with the bottom of the image.
    #[inline]
    pub fn bottom_to_top(&self) -> bool {
        self.descriptor & 0x20 == 0
    }

    /// Columns are stored starting with the right edge of the image.
    #[inline]
    pub fn right_to_left(&self) -> bool {
        self.descriptor & 0x10 != 0
    }

    #[inline]
    pub fn alpha_bits(&self) -> u8 {
        self.descriptor & 0x0F
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width.get().max(0) as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height.get().max(0) as usize
    }

    /// Size of the color map stored after the image ID.
    pub fn color_map_bytes(&self) -> usize {
        (self.color_map_bits / 8) as usize * self.color_map_length.get().max(0) as usize
    }

    /// Destination layout for the pixel depth.
    pub fn layout(&self) -> Result<PixelLayout> {
        match self.bits_per_pixel {
            32 => Ok(PixelLayout::Bgra8888),
            24 => Ok(PixelLayout::Bgr888),
            16 => Ok(PixelLayout::Bgr555),
            8 => Ok(PixelLayout::Indexed8),
            bits => Err(Error::UnsupportedFormat(format!("{} bits per pixel", bits))),
        }
    }

    /// Check image type, color map presence and pixel depth.
    pub fn check(&self) -> Result<()> {
        let format = self.pixel_format();
        if format == PixelFormatTag::Unknown {
            return Err(Error::UnsupportedFormat(format!(
                "image type {}",
                self.image_type
            )));
        }

        if self.width.get() < 0 || self.height.get() < 0 {
            return Err(Error::InvalidHeader(format!(
                "negative dimensions {}x{}",
                self.width.get(),
                self.height.get()
            )));
        }

        if self.color_map_start.get() < 0 || self.color_map_length.get() < 0 {
            return Err(Error::InvalidHeader(format!(
                "negative color map range {}+{}",
                self.color_map_start.get(),
                self.color_map_length.get()
            )));
        }

        if format == PixelFormatTag::Indexed && !self.has_color_map() {
            return Err(Error::MissingPalette);
        }

        match self.bits_per_pixel {
            32 | 24 | 16 => Ok(()),
            8 if format == PixelFormatTag::Indexed || format == PixelFormatTag::Greyscale => Ok(()),
            8 => Err(Error::UnsupportedFormat(format!(
                "8-bit {:?} images",
                format
            ))),
            bits => Err(Error::UnsupportedFormat(format!(
                "{} bits per pixel",
                bits
            ))),
        }
    }

    /// A non-indexed image without a color map that still carries a color map
    /// range, as written by some exporters.
    pub fn needs_repair(&self) -> bool {
        !self.has_color_map()
            && self.pixel_format() != PixelFormatTag::Indexed
            && (self.color_map_start.get() != 0 || self.color_map_length.get() != 0)
    }
}

impl TgaFooter {
    pub const SIZE: usize = 26;

    /// Signature identifying a version 2 file.
    pub const SIGNATURE: &'static [u8; 16] = b"TRUEVISION-XFILE";

    pub fn is_valid(&self) -> bool {
        &self.signature == Self::SIGNATURE && self.reserved == b'.' && self.terminator == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use zerocopy::FromZeros;

    use super::*;

    pub(crate) fn header(image_type: u8, bits: u8, width: i16, height: i16) -> TgaHeader {
        let mut header = TgaHeader::new_zeroed();
        header.image_type = image_type;
        header.bits_per_pixel = bits;
        header.width = I16::new(width);
        header.height = I16::new(height);
        header
    }

    pub(crate) fn with_color_map(mut header: TgaHeader, entries: i16, bits: u8) -> TgaHeader {
        header.color_map_type = 1;
        header.color_map_length = I16::new(entries);
        header.color_map_bits = bits;
        header
    }

    pub(crate) fn footer(extension: u32, developer: u32) -> TgaFooter {
        TgaFooter {
            extension_area_offset: U32::new(extension),
            developer_directory_offset: U32::new(developer),
            signature: *TgaFooter::SIGNATURE,
            reserved: b'.',
            terminator: 0,
        }
    }

    #[test]
    fn test_pixel_format_mapping() {
        let cases = [
            (1, PixelFormatTag::Indexed, false),
            (2, PixelFormatTag::TrueColor, false),
            (3, PixelFormatTag::Greyscale, false),
            (9, PixelFormatTag::Indexed, true),
            (10, PixelFormatTag::TrueColor, true),
            (11, PixelFormatTag::Greyscale, true),
            (0, PixelFormatTag::Unknown, false),
            (4, PixelFormatTag::Unknown, false),
            (12, PixelFormatTag::Unknown, true),
        ];

        for (image_type, format, compressed) in cases {
            let h = header(image_type, 24, 1, 1);
            assert_eq!(h.pixel_format(), format, "image type {image_type}");
            assert_eq!(h.is_compressed(), compressed, "image type {image_type}");
        }
    }

    #[test]
    fn test_rejects_unknown_image_types() {
        for image_type in [0, 4, 8, 12] {
            let err = header(image_type, 24, 1, 1).check().unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat(_)), "image type {image_type}");
        }
    }

    #[test]
    fn test_indexed_requires_color_map() {
        let err = header(1, 8, 1, 1).check().unwrap_err();
        assert!(matches!(err, Error::MissingPalette));
        assert!(err.is_invalid_header());

        assert!(with_color_map(header(1, 8, 1, 1), 256, 24).check().is_ok());
        assert!(with_color_map(header(9, 8, 1, 1), 256, 24).check().is_ok());
    }

    #[test]
    fn test_bit_depths() {
        for bits in [16, 24, 32] {
            assert!(header(2, bits, 1, 1).check().is_ok());
        }
        assert!(header(3, 8, 1, 1).check().is_ok());
        assert!(matches!(
            header(2, 8, 1, 1).check(),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            header(2, 15, 1, 1).check(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_negative_dimensions() {
        assert!(matches!(
            header(2, 24, -1, 1).check(),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_descriptor_flags() {
        let mut h = header(2, 32, 1, 1);
        h.descriptor = 0x08;
        assert!(h.bottom_to_top());
        assert!(!h.right_to_left());
        assert_eq!(h.alpha_bits(), 8);

        h.descriptor = 0x38;
        assert!(!h.bottom_to_top());
        assert!(h.right_to_left());
    }

    #[test]
    fn test_needs_repair() {
        let mut h = header(2, 24, 1, 1);
        assert!(!h.needs_repair());

        h.color_map_length = I16::new(256);
        assert!(h.needs_repair());

        let indexed = with_color_map(header(1, 8, 1, 1), 256, 24);
        assert!(!indexed.needs_repair());
    }

    #[test]
    fn test_footer_signature() {
        assert!(footer(0, 0).is_valid());

        let mut bad = footer(0, 0);
        bad.reserved = 0;
        assert!(!bad.is_valid());

        let mut bad = footer(0, 0);
        bad.signature[0] = b't';
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_color_map_bytes() {
        let h = with_color_map(header(1, 8, 1, 1), 16, 24);
        assert_eq!(h.color_map_bytes(), 48);
        let h = with_color_map(header(1, 8, 1, 1), 16, 32);
        assert_eq!(h.color_map_bytes(), 64);
    }
}
