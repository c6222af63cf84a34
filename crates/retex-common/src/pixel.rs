//! Decoded pixel storage.

use crate::{Error, Palette, Result};

/// Byte layout of a single pixel in a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// 32 bits: R, G, B, A.
    Rgba8888,
    /// 32 bits: B, G, R, A.
    Bgra8888,
    /// 24 bits: B, G, R.
    Bgr888,
    /// 16 bits little-endian `0RRRRRGG GGGBBBBB`.
    Bgr555,
    /// 8 bits, index into the buffer's palette.
    Indexed8,
}

impl PixelLayout {
    /// Bits used by one pixel.
    pub const fn bits_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba8888 | PixelLayout::Bgra8888 => 32,
            PixelLayout::Bgr888 => 24,
            PixelLayout::Bgr555 => 16,
            PixelLayout::Indexed8 => 8,
        }
    }

    /// Bytes used by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        self.bits_per_pixel() / 8
    }

    /// Whether the layout carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelLayout::Rgba8888 | PixelLayout::Bgra8888)
    }
}

/// Physical order of rows inside a [`PixelBuffer`]'s backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowOrder {
    /// The first stored row is the top of the image.
    #[default]
    TopDown,
    /// The first stored row is the bottom of the image (DIB style).
    BottomUp,
}

/// Color model of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormatTag {
    Indexed,
    TrueColor,
    Greyscale,
    Unknown,
}

/// What a consumer needs to know to display a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub has_alpha: bool,
    pub format: PixelFormatTag,
}

/// An owned, contiguous pixel buffer.
///
/// Rows are padded to a multiple of 4 bytes. All access goes through
/// [`PixelBuffer::offset`], which maps a logical `(row, col)` position, where
/// row 0 is the top of the image, to a byte offset in the backing storage
/// according to the buffer's [`RowOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    stride: usize,
    layout: PixelLayout,
    row_order: RowOrder,
    data: Vec<u8>,
    palette: Option<Palette>,
}

impl PixelBuffer {
    /// Create a zeroed top-down buffer.
    pub fn new(width: usize, height: usize, layout: PixelLayout) -> Self {
        Self::with_row_order(width, height, layout, RowOrder::TopDown)
    }

    /// Create a zeroed buffer with an explicit physical row order.
    pub fn with_row_order(
        width: usize,
        height: usize,
        layout: PixelLayout,
        row_order: RowOrder,
    ) -> Self {
        let stride = Self::stride_for(width, layout);
        Self {
            width,
            height,
            stride,
            layout,
            row_order,
            data: vec![0u8; stride * height],
            palette: None,
        }
    }

    /// Row length in bytes for `width` pixels, rounded up to a multiple of 4.
    #[inline]
    pub const fn stride_for(width: usize, layout: PixelLayout) -> usize {
        (width * layout.bytes_per_pixel() + 3) & !3
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Byte length of one stored row, including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    #[inline]
    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    /// The raw backing storage in physical row order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its backing storage.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Attach the color table used to resolve [`PixelLayout::Indexed8`] pixels.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = Some(palette);
    }

    /// Byte offset of the pixel at logical `(row, col)`.
    pub fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(Error::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }

        let physical_row = match self.row_order {
            RowOrder::TopDown => row,
            RowOrder::BottomUp => self.height - 1 - row,
        };

        Ok(physical_row * self.stride + col * self.layout.bytes_per_pixel())
    }

    /// The pixel bytes of logical row `row`, without padding.
    pub fn row(&self, row: usize) -> Result<&[u8]> {
        let start = self.offset(row, 0)?;
        Ok(&self.data[start..start + self.width * self.layout.bytes_per_pixel()])
    }

    /// Mutable pixel bytes of logical row `row`, without padding.
    pub fn row_mut(&mut self, row: usize) -> Result<&mut [u8]> {
        let start = self.offset(row, 0)?;
        let len = self.width * self.layout.bytes_per_pixel();
        Ok(&mut self.data[start..start + len])
    }

    /// The bytes of one pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Result<&[u8]> {
        let start = self.offset(row, col)?;
        Ok(&self.data[start..start + self.layout.bytes_per_pixel()])
    }

    /// Overwrite one pixel. Extra input bytes are ignored.
    pub fn write_pixel(&mut self, row: usize, col: usize, bytes: &[u8]) -> Result<()> {
        let start = self.offset(row, col)?;
        let len = self.layout.bytes_per_pixel().min(bytes.len());
        self.data[start..start + len].copy_from_slice(&bytes[..len]);
        Ok(())
    }

    /// Expand to tightly packed, top-down RGBA bytes.
    ///
    /// Indexed pixels resolve through the palette, or through a grey ramp when
    /// no palette is attached.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let greyscale;
        let palette = match &self.palette {
            Some(palette) => palette,
            None => {
                greyscale = Palette::greyscale();
                &greyscale
            }
        };

        let bpp = self.layout.bytes_per_pixel();
        let mut out = Vec::with_capacity(self.width * self.height * 4);

        for row in 0..self.height {
            let start = match self.row_order {
                RowOrder::TopDown => row,
                RowOrder::BottomUp => self.height - 1 - row,
            } * self.stride;
            let pixels = &self.data[start..start + self.width * bpp];

            for p in pixels.chunks_exact(bpp) {
                let rgba = match self.layout {
                    PixelLayout::Rgba8888 => [p[0], p[1], p[2], p[3]],
                    PixelLayout::Bgra8888 => [p[2], p[1], p[0], p[3]],
                    PixelLayout::Bgr888 => [p[2], p[1], p[0], 0xFF],
                    PixelLayout::Bgr555 => {
                        let v = u16::from_le_bytes([p[0], p[1]]);
                        [
                            scale5((v >> 10) & 0x1F),
                            scale5((v >> 5) & 0x1F),
                            scale5(v & 0x1F),
                            0xFF,
                        ]
                    }
                    PixelLayout::Indexed8 => palette.get(p[0]).to_rgba(),
                };
                out.extend_from_slice(&rgba);
            }
        }

        out
    }
}

#[inline]
fn scale5(channel: u16) -> u8 {
    (channel as u32 * 0xFF / 0x1F) as u8
}
