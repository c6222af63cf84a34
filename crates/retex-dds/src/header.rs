//! DDS header structures and validation.

use std::fmt;
use std::io::Read;

use retex_common::little_endian::U32;
use retex_common::{PixelFormatTag, ReadExt};
use tracing::debug;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::block::DxtFormat;
use crate::{Error, Result, DDS_MAGIC};

/// Surface description flag: `caps` is valid.
pub const DDSD_CAPS: u32 = 0x0000_0001;
/// Surface description flag: `height` is valid.
pub const DDSD_HEIGHT: u32 = 0x0000_0002;
/// Surface description flag: `width` is valid.
pub const DDSD_WIDTH: u32 = 0x0000_0004;
/// Surface description flag: `pitch_or_linear_size` is a pitch.
pub const DDSD_PITCH: u32 = 0x0000_0008;
/// Surface description flag: `pixel_format` is valid.
pub const DDSD_PIXELFORMAT: u32 = 0x0000_1000;
/// Surface description flag: `mipmap_count` is valid.
pub const DDSD_MIPMAPCOUNT: u32 = 0x0002_0000;
/// Surface description flag: `pitch_or_linear_size` is a linear size.
pub const DDSD_LINEARSIZE: u32 = 0x0008_0000;
/// Surface description flag: `depth` is valid.
pub const DDSD_DEPTH: u32 = 0x0080_0000;

/// Pixel format flag: the format has alpha pixels.
pub const DDPF_ALPHAPIXELS: u32 = 0x0000_0001;
/// Pixel format flag: alpha-only surface.
pub const DDPF_ALPHA: u32 = 0x0000_0002;
/// Pixel format flag: `four_cc` is valid.
pub const DDPF_FOURCC: u32 = 0x0000_0004;
/// Pixel format flag: uncompressed RGB data.
pub const DDPF_RGB: u32 = 0x0000_0040;
/// Pixel format flag: single channel luminance data.
pub const DDPF_LUMINANCE: u32 = 0x0002_0000;

/// Capability flag: more than one surface.
pub const DDSCAPS_COMPLEX: u32 = 0x0000_0008;
/// Capability flag: the file holds a texture.
pub const DDSCAPS_TEXTURE: u32 = 0x0000_1000;
/// Capability flag: the file holds a mipmap chain.
pub const DDSCAPS_MIPMAP: u32 = 0x0040_0000;

/// Capability flag: cube map.
pub const DDSCAPS2_CUBEMAP: u32 = 0x0000_0200;
/// Capability flag: volume texture.
pub const DDSCAPS2_VOLUME: u32 = 0x0020_0000;

/// DDS surface description, the 124 bytes following the magic.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: U32,
    /// Header flags.
    pub flags: U32,
    /// Image height.
    pub height: U32,
    /// Image width.
    pub width: U32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: U32,
    /// Depth (for volume textures).
    pub depth: U32,
    /// Number of mipmap levels.
    pub mipmap_count: U32,
    /// Reserved.
    pub reserved1: [U32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: DdsCaps,
    /// Reserved.
    pub reserved2: U32,
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: U32,
    /// Pixel format flags.
    pub flags: U32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: U32,
    /// Red bit mask.
    pub r_bit_mask: U32,
    /// Green bit mask.
    pub g_bit_mask: U32,
    /// Blue bit mask.
    pub b_bit_mask: U32,
    /// Alpha bit mask.
    pub a_bit_mask: U32,
}

/// DDS surface capabilities.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsCaps {
    pub caps1: U32,
    pub caps2: U32,
    pub reserved: [U32; 2],
}

const _: () = assert!(std::mem::size_of::<DdsPixelFormat>() == DdsPixelFormat::SIZE as usize);
const _: () = assert!(std::mem::size_of::<DdsCaps>() == 16);
const _: () = assert!(std::mem::size_of::<DdsHeader>() == DdsHeader::SIZE as usize);
const _: () = assert!(DDS_MAGIC.len() + std::mem::size_of::<DdsHeader>() == 128);

/// Four-character code for compression type.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT2 compression (premultiplied DXT3).
    pub const DXT2: Self = Self(*b"DXT2");
    /// DXT3 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT4 compression (premultiplied DXT5).
    pub const DXT4: Self = Self(*b"DXT4");
    /// DXT5 compression.
    pub const DXT5: Self = Self(*b"DXT5");

    /// The code as a little-endian integer (`DXT1` is `0x31545844`).
    pub const fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            self.0.iter().try_for_each(|&b| write!(f, "{}", b as char))
        } else {
            write!(f, "{:#010x}", self.as_u32())
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Flags every readable header must carry.
    pub const REQUIRED_FLAGS: u32 = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;

    /// Read the magic and surface description, then validate them.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let magic: [u8; 4] = reader.read_record()?;
        if &magic != DDS_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let header: DdsHeader = reader.read_record()?;
        header.validate()?;

        debug!(
            width = header.width(),
            height = header.height(),
            four_cc = %header.pixel_format.four_cc,
            pf_flags = header.pixel_format.flags.get(),
            mipmaps = header.mipmap_count.get(),
            "parsed DDS header"
        );

        Ok(header)
    }

    /// Check the structure sizes and required flags.
    pub fn validate(&self) -> Result<()> {
        if self.size.get() != Self::SIZE {
            return Err(Error::InvalidHeader(format!(
                "header size is {}, expected {}",
                self.size.get(),
                Self::SIZE
            )));
        }

        if self.pixel_format.size.get() != DdsPixelFormat::SIZE {
            return Err(Error::InvalidHeader(format!(
                "pixel format size is {}, expected {}",
                self.pixel_format.size.get(),
                DdsPixelFormat::SIZE
            )));
        }

        let missing = Self::REQUIRED_FLAGS & !self.flags.get();
        if missing != 0 {
            return Err(Error::InvalidHeader(format!(
                "required flags {:#x} not set",
                missing
            )));
        }

        Ok(())
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height.get()
    }

    /// Select the block decoder for this surface.
    pub fn format(&self) -> Result<DxtFormat> {
        let pf = &self.pixel_format;

        if pf.has_flag(DDPF_RGB) {
            return Err(Error::UnsupportedFormat(format!(
                "uncompressed {}-bit RGB surfaces",
                pf.rgb_bit_count.get()
            )));
        }

        if pf.has_flag(DDPF_FOURCC) {
            return DxtFormat::from_four_cc(pf.four_cc).ok_or_else(|| {
                Error::UnsupportedFormat(format!("FourCC {} is not supported", pf.four_cc))
            });
        }

        Err(Error::UnsupportedFormat(format!(
            "pixel format flags {:#x} name neither FourCC nor RGB data",
            pf.flags.get()
        )))
    }
}

impl DdsPixelFormat {
    /// Expected structure size.
    pub const SIZE: u32 = 32;

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags.get() & flag == flag
    }

    /// Color model implied by the flags.
    pub fn format_tag(&self) -> PixelFormatTag {
        if self.has_flag(DDPF_LUMINANCE) {
            PixelFormatTag::Greyscale
        } else if self.has_flag(DDPF_FOURCC) || self.has_flag(DDPF_RGB) {
            PixelFormatTag::TrueColor
        } else {
            PixelFormatTag::Unknown
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use zerocopy::FromZeros;

    use super::*;

    pub(crate) fn dxt_header(width: u32, height: u32, four_cc: FourCC) -> DdsHeader {
        let mut header = DdsHeader::new_zeroed();
        header.size = U32::new(DdsHeader::SIZE);
        header.flags = U32::new(DdsHeader::REQUIRED_FLAGS | DDSD_LINEARSIZE);
        header.width = U32::new(width);
        header.height = U32::new(height);
        header.mipmap_count = U32::new(1);
        header.pixel_format.size = U32::new(DdsPixelFormat::SIZE);
        header.pixel_format.flags = U32::new(DDPF_FOURCC);
        header.pixel_format.four_cc = four_cc;
        header.caps.caps1 = U32::new(DDSCAPS_TEXTURE);
        header
    }

    pub(crate) fn dds_bytes(header: &DdsHeader, blocks: &[u8]) -> Vec<u8> {
        let mut data = DDS_MAGIC.to_vec();
        data.extend_from_slice(header.as_bytes());
        data.extend_from_slice(blocks);
        data
    }

    #[test]
    fn test_four_cc_values() {
        assert_eq!(FourCC::DXT1.as_u32(), 0x3154_5844);
        assert_eq!(FourCC::DXT5.as_u32(), 0x3554_5844);
        assert_eq!(FourCC::DXT3.to_string(), "DXT3");
        assert_eq!(FourCC([0, 1, 2, 3]).to_string(), "0x03020100");
    }

    #[test]
    fn test_read_valid_header() {
        let data = dds_bytes(&dxt_header(8, 4, FourCC::DXT1), &[]);
        assert_eq!(data.len(), 128);

        let header = DdsHeader::read(&mut Cursor::new(data)).unwrap();
        assert_eq!(header.width(), 8);
        assert_eq!(header.height(), 4);
        assert_eq!(header.format().unwrap(), DxtFormat::Dxt1);
        assert_eq!(header.pixel_format.format_tag(), PixelFormatTag::TrueColor);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = dds_bytes(&dxt_header(4, 4, FourCC::DXT1), &[]);
        data[3] = b'X';

        let err = DdsHeader::read(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(m) if &m == b"DDSX"));
        assert!(err.is_invalid_header());
    }

    #[test]
    fn test_bad_sizes() {
        let mut header = dxt_header(4, 4, FourCC::DXT1);
        header.size = U32::new(128);
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));

        let mut header = dxt_header(4, 4, FourCC::DXT1);
        header.pixel_format.size = U32::new(24);
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_missing_required_flag() {
        let mut header = dxt_header(4, 4, FourCC::DXT1);
        header.flags = U32::new(DDSD_CAPS | DDSD_WIDTH | DDSD_HEIGHT);
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_truncated_header() {
        let data = dds_bytes(&dxt_header(4, 4, FourCC::DXT1), &[]);
        let err = DdsHeader::read(&mut Cursor::new(&data[..100])).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_format_dispatch() {
        assert_eq!(
            dxt_header(4, 4, FourCC::DXT2).format().unwrap(),
            DxtFormat::Dxt3
        );
        assert_eq!(
            dxt_header(4, 4, FourCC::DXT4).format().unwrap(),
            DxtFormat::Dxt5
        );

        let err = dxt_header(4, 4, FourCC(*b"ATI2")).format().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rgb_surface_is_unsupported() {
        let mut header = dxt_header(4, 4, FourCC([0; 4]));
        header.pixel_format.flags = U32::new(DDPF_RGB | DDPF_ALPHAPIXELS);
        header.pixel_format.rgb_bit_count = U32::new(32);

        let err = header.format().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref msg) if msg.contains("RGB")));
    }
}
