//! Assembly of decoded blocks into a pixel buffer.

use std::io::Read;

use retex_common::{PixelBuffer, PixelLayout, ReadExt, RowOrder};
use tracing::trace;

use crate::block::{DxtBlock, DxtFormat};
use crate::color::Color8888;
use crate::Result;

/// What to do with pixels in a partial trailing row or column of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgePolicy {
    /// Round the output size down to a multiple of 4 and drop the partial
    /// blocks' pixels.
    #[default]
    Truncate,
    /// Keep the full size and decode the visible part of partial blocks.
    Keep,
}

/// Options for decoding a DDS surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DdsDecodeOptions {
    /// Physical row order of the output buffer.
    pub row_order: RowOrder,
    /// Handling of image sizes that are not a multiple of 4.
    pub edges: EdgePolicy,
}

/// Dimensions of the source block grid and the destination image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub blocks_x: usize,
    pub blocks_y: usize,
    pub width: usize,
    pub height: usize,
}

impl SurfaceLayout {
    pub fn new(width: u32, height: u32, edges: EdgePolicy) -> Self {
        let (width, height) = (width as usize, height as usize);
        let (dst_width, dst_height) = match edges {
            EdgePolicy::Truncate => (width & !3, height & !3),
            EdgePolicy::Keep => (width, height),
        };

        Self {
            blocks_x: width.div_ceil(4),
            blocks_y: height.div_ceil(4),
            width: dst_width,
            height: dst_height,
        }
    }

    /// Compressed size of the surface.
    pub fn compressed_size(&self, format: DxtFormat) -> u64 {
        self.blocks_x as u64 * self.blocks_y as u64 * format.bytes_per_block() as u64
    }
}

/// Decode the top-level surface from `reader`, which must be positioned at the
/// first block.
///
/// Blocks are consumed in row-major grid order. Blocks wholly outside the
/// destination are still read so the stream stays aligned to the grid.
pub fn decode_surface<R: Read + ?Sized>(
    reader: &mut R,
    surface: SurfaceLayout,
    format: DxtFormat,
    row_order: RowOrder,
) -> Result<PixelBuffer> {
    let mut buffer =
        PixelBuffer::with_row_order(surface.width, surface.height, PixelLayout::Rgba8888, row_order);

    let block_size = format.bytes_per_block();
    let mut block_row = vec![0u8; surface.blocks_x * block_size];

    for by in 0..surface.blocks_y {
        reader.fill_exact(&mut block_row)?;

        let y = by * 4;
        if y >= surface.height {
            trace!(row = by, "skipping block row outside destination");
            continue;
        }
        let block_height = (surface.height - y).min(4);

        for (bx, bytes) in block_row.chunks_exact(block_size).enumerate() {
            let x = bx * 4;
            if x >= surface.width {
                break;
            }
            let block_width = (surface.width - x).min(4);

            let texels = DxtBlock::parse(format, bytes)?.decode();
            write_block(&mut buffer, &texels, x, y, block_width, block_height)?;
        }
    }

    Ok(buffer)
}

/// Copy the top-left `width x height` texels of a block to `(x, y)`.
fn write_block(
    buffer: &mut PixelBuffer,
    texels: &[Color8888; 16],
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Result<()> {
    for ty in 0..height {
        for tx in 0..width {
            buffer.write_pixel(y + ty, x + tx, &texels[ty * 4 + tx].to_rgba())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::block::tests::{dxt1_bytes, RAMP_ROWS};

    const RED: u16 = 0xF800;
    const GREEN: u16 = 0x07E0;
    const BLUE: u16 = 0x001F;

    fn solid(color: u16) -> [u8; 8] {
        dxt1_bytes(color, color, [0; 4])
    }

    fn blocks(colors: &[u16]) -> Vec<u8> {
        colors.iter().flat_map(|&c| solid(c)).collect()
    }

    #[test]
    fn test_surface_layout_truncates() {
        let layout = SurfaceLayout::new(6, 6, EdgePolicy::Truncate);
        assert_eq!((layout.width, layout.height), (4, 4));
        assert_eq!((layout.blocks_x, layout.blocks_y), (2, 2));
        assert_eq!(layout.compressed_size(DxtFormat::Dxt1), 32);

        let layout = SurfaceLayout::new(6, 6, EdgePolicy::Keep);
        assert_eq!((layout.width, layout.height), (6, 6));
    }

    #[test]
    fn test_decode_grid_placement() {
        // 8x8: red, green / blue, red
        let data = blocks(&[RED, GREEN, BLUE, RED]);
        let surface = SurfaceLayout::new(8, 8, EdgePolicy::Truncate);
        let buffer =
            decode_surface(&mut Cursor::new(data), surface, DxtFormat::Dxt1, RowOrder::TopDown)
                .unwrap();

        assert_eq!(buffer.pixel(0, 0).unwrap(), &[255, 0, 0, 255]);
        assert_eq!(buffer.pixel(3, 7).unwrap(), &[0, 255, 0, 255]);
        assert_eq!(buffer.pixel(4, 3).unwrap(), &[0, 0, 255, 255]);
        assert_eq!(buffer.pixel(7, 7).unwrap(), &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_bottom_up_destination() {
        let data = blocks(&[RED, BLUE]);
        let surface = SurfaceLayout::new(4, 8, EdgePolicy::Truncate);
        let buffer =
            decode_surface(&mut Cursor::new(data), surface, DxtFormat::Dxt1, RowOrder::BottomUp)
                .unwrap();

        // Logical top is still red, but it is stored last.
        assert_eq!(buffer.pixel(0, 0).unwrap(), &[255, 0, 0, 255]);
        assert_eq!(&buffer.data()[..4], &[0, 0, 255, 255]);
        assert_eq!(&buffer.data()[buffer.data().len() - 4..], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_truncate_skips_partial_blocks_but_consumes_them() {
        // 6x10 source: 2x3 blocks. Only column 0 of rows 0 and 1 are visible.
        let data = blocks(&[RED, GREEN, BLUE, GREEN, GREEN, GREEN]);
        let surface = SurfaceLayout::new(6, 10, EdgePolicy::Truncate);
        let mut cursor = Cursor::new(data);
        let buffer =
            decode_surface(&mut cursor, surface, DxtFormat::Dxt1, RowOrder::TopDown).unwrap();

        assert_eq!((buffer.width(), buffer.height()), (4, 8));
        assert_eq!(buffer.pixel(0, 0).unwrap(), &[255, 0, 0, 255]);
        assert_eq!(buffer.pixel(4, 0).unwrap(), &[0, 0, 255, 255]);
        assert_eq!(cursor.position(), 48);
    }

    #[test]
    fn test_keep_decodes_partial_blocks() {
        // 6x6 source, texel row indices 0, 1, 2, 3 from left to right.
        let block = dxt1_bytes(RED, BLUE, RAMP_ROWS);
        let data: Vec<u8> = std::iter::repeat(block).take(4).flatten().collect();
        let surface = SurfaceLayout::new(6, 6, EdgePolicy::Keep);
        let buffer =
            decode_surface(&mut Cursor::new(data), surface, DxtFormat::Dxt1, RowOrder::TopDown)
                .unwrap();

        assert_eq!((buffer.width(), buffer.height()), (6, 6));
        // Column 4 is texel 0 of the second block, column 5 is texel 1.
        assert_eq!(buffer.pixel(5, 4).unwrap(), &[255, 0, 0, 255]);
        assert_eq!(buffer.pixel(5, 5).unwrap(), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_truncated_block_data() {
        let data = blocks(&[RED]);
        let surface = SurfaceLayout::new(8, 4, EdgePolicy::Truncate);
        let err =
            decode_surface(&mut Cursor::new(data), surface, DxtFormat::Dxt1, RowOrder::TopDown)
                .unwrap_err();
        assert!(err.is_truncated());
    }
}
