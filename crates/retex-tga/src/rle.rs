//! Truevision run-length packet decoding.
//!
//! Each packet starts with a control byte. With the high bit set the packet
//! is a run: one pixel follows and is repeated `(control & 0x7F) + 1` times.
//! Otherwise the packet is raw: `(control & 0x7F) + 1` literal pixels follow.
//! Packets know nothing about rows, so a run may wrap across scanlines.

use std::io::{self, Read};

use byteorder::ReadBytesExt;
use retex_common::ReadExt;
use tracing::trace;

use crate::Result;

const RUN_FLAG: u8 = 0x80;
const COUNT_MASK: u8 = 0x7F;

/// Decompresses RLE packets from an inner reader.
///
/// Implements [`Read`] so pixel rows can be filled straight from it.
#[derive(Debug)]
pub struct RleReader<R> {
    inner: R,
    bytes_per_pixel: usize,
    packet: Vec<u8>,
    cursor: usize,
}

impl<R: Read> RleReader<R> {
    /// Wrap `inner`; `bytes_per_pixel` is fixed for the reader's lifetime.
    pub fn new(inner: R, bytes_per_pixel: usize) -> Self {
        Self {
            inner,
            bytes_per_pixel,
            packet: Vec::with_capacity(128 * bytes_per_pixel),
            cursor: 0,
        }
    }

    /// Next decoded byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.cursor >= self.packet.len() && !self.next_packet()? {
            return Err(retex_common::Error::Truncated {
                needed: 1,
                available: 0,
            }
            .into());
        }

        let byte = self.packet[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    /// Decode the next packet into the internal buffer.
    ///
    /// Returns `false` if the inner reader ends cleanly before a control byte.
    pub fn next_packet(&mut self) -> Result<bool> {
        let control = match self.inner.read_u8() {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let count = (control & COUNT_MASK) as usize + 1;
        let is_run = control & RUN_FLAG != 0;

        self.packet.clear();
        self.cursor = 0;

        if is_run {
            let pixel = self.inner.read_bytes_exact(self.bytes_per_pixel)?;
            for _ in 0..count {
                self.packet.extend_from_slice(&pixel);
            }
        } else {
            self.packet.resize(count * self.bytes_per_pixel, 0);
            if let Err(e) = self.inner.fill_exact(&mut self.packet) {
                self.packet.clear();
                return Err(e.into());
            }
        }

        trace!(is_run, count, "RLE packet");
        Ok(true)
    }

    /// Unwrap the inner reader. Undelivered bytes of the current packet are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for RleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            if self.cursor >= self.packet.len() {
                match self.next_packet() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) if e.is_truncated() => {
                        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, e))
                    }
                    Err(e) => return Err(io::Error::other(e)),
                }
            }

            let available = &self.packet[self.cursor..];
            let n = available.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&available[..n]);
            self.cursor += n;
            written += n;
        }

        Ok(written)
    }
}
