//! Standalone header pre-check and in-place repair.

use std::io::{Read, Seek, SeekFrom, Write};

use retex_common::little_endian::I16;
use retex_common::{ReadExt, WriteExt};
use tracing::{debug, warn};

use crate::header::TgaHeader;
use crate::Result;

/// Read and check the header at the current position without decoding pixels.
///
/// The stream position is restored on success.
pub fn validate<R: Read + Seek>(reader: &mut R) -> Result<TgaHeader> {
    let start = reader.stream_position()?;
    let header: TgaHeader = reader.read_record()?;
    header.check()?;
    reader.seek(SeekFrom::Start(start))?;

    debug!(
        image_type = header.image_type,
        bits = header.bits_per_pixel,
        width = header.width(),
        height = header.height(),
        "validated TGA header"
    );

    Ok(header)
}

/// Like [`validate`], then zero stray color map fields on images that have no
/// color map and rewrite the header in place.
///
/// Returns whether the header was rewritten.
pub fn validate_and_repair<S: Read + Write + Seek>(stream: &mut S) -> Result<bool> {
    let start = stream.stream_position()?;
    let mut header = validate(stream)?;

    if !header.needs_repair() {
        return Ok(false);
    }

    warn!(
        color_map_start = header.color_map_start.get(),
        color_map_length = header.color_map_length.get(),
        "clearing color map range on image without a color map"
    );

    header.color_map_start = I16::new(0);
    header.color_map_length = I16::new(0);
    stream.write_record(&header)?;
    stream.flush()?;
    stream.seek(SeekFrom::Start(start))?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use zerocopy::IntoBytes;

    use super::*;
    use crate::header::tests::{header, with_color_map};
    use crate::Error;

    #[test]
    fn test_validate_restores_position() {
        let mut data = vec![0xAA, 0xBB];
        data.extend_from_slice(header(2, 24, 2, 2).as_bytes());
        let mut cursor = Cursor::new(data);
        cursor.set_position(2);

        let parsed = validate(&mut cursor).unwrap();
        assert_eq!(parsed.width(), 2);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_validate_short_header() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(validate(&mut cursor).unwrap_err().is_truncated());
    }

    #[test]
    fn test_validate_rejects_indexed_without_map() {
        let mut cursor = Cursor::new(header(1, 8, 1, 1).as_bytes().to_vec());
        assert!(matches!(
            validate(&mut cursor),
            Err(Error::MissingPalette)
        ));
    }

    #[test]
    fn test_repair_clears_stray_color_map() {
        let mut stray = header(2, 24, 1, 1);
        stray.color_map_start = I16::new(3);
        stray.color_map_length = I16::new(256);
        let mut data = stray.as_bytes().to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        let mut cursor = Cursor::new(data);

        assert!(validate_and_repair(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        let fixed = validate(&mut cursor).unwrap();
        assert_eq!(fixed.color_map_start.get(), 0);
        assert_eq!(fixed.color_map_length.get(), 0);
        assert!(!fixed.needs_repair());
        assert_eq!(&cursor.get_ref()[TgaHeader::SIZE..], &[1, 2, 3]);

        assert!(!validate_and_repair(&mut cursor).unwrap());
    }

    #[test]
    fn test_repair_leaves_indexed_alone() {
        let indexed = with_color_map(header(1, 8, 1, 1), 2, 24);
        let before = indexed.as_bytes().to_vec();
        let mut cursor = Cursor::new(before.clone());

        assert!(!validate_and_repair(&mut cursor).unwrap());
        assert_eq!(cursor.into_inner(), before);
    }

    #[test]
    fn test_repair_does_not_write_invalid_headers() {
        let mut bad = header(4, 24, 1, 1);
        bad.color_map_length = I16::new(4);
        let before = bad.as_bytes().to_vec();
        let mut cursor = Cursor::new(before.clone());

        assert!(validate_and_repair(&mut cursor).is_err());
        assert_eq!(cursor.into_inner(), before);
    }
}
