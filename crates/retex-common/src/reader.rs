//! Fixed-layout record codec over `std::io` streams.
//!
//! Records are `#[repr(C)]` structs built from bytes, byte arrays and
//! zerocopy's little-endian integer wrappers, so a record's in-memory bytes
//! are exactly its on-disk bytes: no padding, no alignment, no byte swapping.

use std::io::{self, Read, Write};

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::{Error, Result};

/// Extends [`Read`] with exact-length reads that report truncation.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use retex_common::ReadExt;
///
/// let mut cursor = Cursor::new(vec![0x44, 0x44, 0x53, 0x20, 0x01]);
/// cursor.expect_magic(b"DDS ").unwrap();
/// assert_eq!(cursor.read_bytes_exact(1).unwrap(), vec![0x01]);
/// assert!(cursor.read_bytes_exact(1).unwrap_err().is_truncated());
/// ```
pub trait ReadExt: Read {
    /// Fill `buf` completely or fail with [`Error::Truncated`].
    ///
    /// Unlike [`Read::read_exact`] the error carries how many bytes were
    /// actually available before the stream ended.
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let needed = buf.len();
        let mut filled = 0;

        while filled < needed {
            match self.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::Truncated {
                        needed,
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(Error::Truncated {
                        needed,
                        available: filled,
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Read exactly `count` bytes into a new vector.
    fn read_bytes_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        self.fill_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Read a fixed-layout record, consuming exactly `size_of::<T>()` bytes.
    fn read_record<T: FromBytes + IntoBytes>(&mut self) -> Result<T> {
        let mut value = T::new_zeroed();
        self.fill_exact(value.as_mut_bytes())?;
        Ok(value)
    }

    /// Expect specific magic bytes.
    fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read_bytes_exact(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

/// Extends [`Write`] with the inverse of [`ReadExt::read_record`].
pub trait WriteExt: Write {
    /// Write a fixed-layout record verbatim.
    fn write_record<T: IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        self.write_all(value.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}
