//! Palette construction and pixel assembly.

use std::io::Read;

use retex_common::{Color, Palette, PixelBuffer, PixelFormatTag, PixelLayout, ReadExt};
use tracing::trace;

use crate::header::TgaHeader;
use crate::{Error, Result};

/// Build the palette for an 8-bit image, or `None` for deeper images.
///
/// Indexed palettes come from `color_map`; each entry's last three bytes are
/// read back to front as red, green, blue.
pub fn build_palette(header: &TgaHeader, color_map: &[u8]) -> Result<Option<Palette>> {
    if header.bits_per_pixel != 8 {
        return Ok(None);
    }

    match header.pixel_format() {
        PixelFormatTag::Greyscale => Ok(Some(Palette::greyscale())),
        PixelFormatTag::Indexed => {
            let bytes_per_color = (header.color_map_bits / 8) as usize;
            if bytes_per_color < 3 {
                return Err(Error::UnsupportedFormat(format!(
                    "{}-bit color map entries",
                    header.color_map_bits
                )));
            }

            let mut palette = Palette::new(Palette::MAX_ENTRIES)?;
            let start = header.color_map_start.get().max(0) as usize;

            let mut i = start + bytes_per_color - 1;
            while i < color_map.len() {
                let index = i / bytes_per_color;
                let entry = palette
                    .get_mut(index)
                    .ok_or(Error::PaletteSizeMismatch {
                        index,
                        max: Palette::MAX_ENTRIES,
                    })?;
                *entry = Color::rgb(color_map[i], color_map[i - 1], color_map[i - 2]);
                i += bytes_per_color;
            }

            Ok(Some(palette))
        }
        _ => Ok(None),
    }
}

/// Read `width x height` pixels from `reader` into a new buffer.
///
/// `reader` yields raw pixel bytes: the file stream itself, or an
/// [`RleReader`](crate::RleReader) over it. Rows stored bottom to top land
/// flipped so row 0 of the buffer is the top of the image. Columns are
/// always stored left to right.
pub fn read_pixels<R: Read + ?Sized>(
    reader: &mut R,
    header: &TgaHeader,
    layout: PixelLayout,
) -> Result<PixelBuffer> {
    let (width, height) = (header.width(), header.height());
    let mut buffer = PixelBuffer::new(width, height, layout);
    let flip = header.bottom_to_top();

    for source_row in 0..height {
        let row = if flip {
            height - 1 - source_row
        } else {
            source_row
        };
        reader.fill_exact(buffer.row_mut(row)?)?;
        trace!(source_row, row, "read TGA row");
    }

    Ok(buffer)
}
