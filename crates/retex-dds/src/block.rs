//! DXT block layouts and the per-block decoder.
//!
//! Every variant stores its color data in the same 8-byte [`ColorBlock`].
//! DXT3 and DXT5 prepend 8 bytes of alpha data. The color palette of a block
//! is computed by the shared [`block_palette`]; only alpha derivation differs
//! between variants.

use std::mem::size_of;

use retex_common::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::color::{scale4, Color565, Color888, Color8888};
use crate::header::FourCC;
use crate::{Error, Result};

/// Block-compression variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DxtFormat {
    /// 8-byte blocks, 1-bit punch-through alpha.
    Dxt1,
    /// 16-byte blocks, explicit 4-bit alpha. Also decodes DXT2.
    Dxt3,
    /// 16-byte blocks, interpolated 3-bit alpha. Also decodes DXT4.
    Dxt5,
}

impl DxtFormat {
    /// Map a FourCC to its decoder. Premultiplied variants decode like their
    /// straight-alpha counterparts.
    pub fn from_four_cc(four_cc: FourCC) -> Option<Self> {
        match four_cc {
            FourCC::DXT1 => Some(DxtFormat::Dxt1),
            FourCC::DXT2 | FourCC::DXT3 => Some(DxtFormat::Dxt3),
            FourCC::DXT4 | FourCC::DXT5 => Some(DxtFormat::Dxt5),
            _ => None,
        }
    }

    /// Compressed size of one 4x4 block.
    pub const fn bytes_per_block(self) -> usize {
        match self {
            DxtFormat::Dxt1 => size_of::<Dxt1Block>(),
            DxtFormat::Dxt3 => size_of::<Dxt3Block>(),
            DxtFormat::Dxt5 => size_of::<Dxt5Block>(),
        }
    }

    /// Canonical FourCC for this variant.
    pub const fn four_cc(self) -> FourCC {
        match self {
            DxtFormat::Dxt1 => FourCC::DXT1,
            DxtFormat::Dxt3 => FourCC::DXT3,
            DxtFormat::Dxt5 => FourCC::DXT5,
        }
    }
}

/// Two 5:6:5 reference colors and a 4x4 grid of 2-bit palette indices.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ColorBlock {
    pub colors: [U16; 2],
    /// One byte per texel row, texel `x` at bits `2x..2x+2`.
    pub rows: [u8; 4],
}

/// DXT3 alpha: a 4x4 grid of 4-bit values.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ExplicitAlphaBlock {
    /// One 16-bit word per texel row, texel `x` at bits `4x..4x+4`.
    pub rows: [U16; 4],
}

/// DXT5 alpha: two reference alphas and a 4x4 grid of 3-bit ramp indices.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct InterpolatedAlphaBlock {
    pub alpha: [u8; 2],
    /// Three bytes per pair of rows, 12 bits per row.
    pub indices: [u8; 6],
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Dxt1Block {
    pub color: ColorBlock,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Dxt3Block {
    pub alpha: ExplicitAlphaBlock,
    pub color: ColorBlock,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Dxt5Block {
    pub alpha: InterpolatedAlphaBlock,
    pub color: ColorBlock,
}

const _: () = assert!(size_of::<Dxt1Block>() == 8);
const _: () = assert!(size_of::<Dxt3Block>() == 16);
const _: () = assert!(size_of::<Dxt5Block>() == 16);

impl ColorBlock {
    #[inline]
    pub fn color0(&self) -> Color565 {
        Color565(self.colors[0].get())
    }

    #[inline]
    pub fn color1(&self) -> Color565 {
        Color565(self.colors[1].get())
    }

    /// Palette index of texel `(x, y)`.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> usize {
        ((self.rows[y] >> (x * 2)) & 0x3) as usize
    }
}

impl ExplicitAlphaBlock {
    /// 8-bit alpha of texel `(x, y)`.
    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        scale4(((self.rows[y].get() >> (x * 4)) & 0xF) as u8)
    }
}

impl InterpolatedAlphaBlock {
    /// The 8-entry alpha ramp selected by the reference alphas.
    #[inline]
    pub fn ramp(&self) -> [u8; 8] {
        alpha_ramp(self.alpha[0], self.alpha[1])
    }

    /// Ramp index of texel `(x, y)`.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> usize {
        let i = (y / 2) * 3;
        let bits = self.indices[i] as u32
            | (self.indices[i + 1] as u32) << 8
            | (self.indices[i + 2] as u32) << 16;
        let shift = x * 3 + (y & 1) * 12;
        ((bits >> shift) & 0x7) as usize
    }
}

/// Compute the four colors a block's 2-bit indices select from.
///
/// With `allow_transparent` (DXT1 only) a block whose first reference color
/// does not exceed the second, compared as raw 5:6:5 words, uses three colors
/// plus transparent black.
pub fn block_palette(block: &ColorBlock, allow_transparent: bool) -> [Color8888; 4] {
    let c0 = block.color0().to_color888();
    let c1 = block.color1().to_color888();

    if block.color0() > block.color1() || !allow_transparent {
        [
            c0.with_alpha(0xFF),
            c1.with_alpha(0xFF),
            blend(c0, c1, 2, 1),
            blend(c0, c1, 1, 2),
        ]
    } else {
        [
            c0.with_alpha(0xFF),
            c1.with_alpha(0xFF),
            blend(c0, c1, 1, 1),
            Color8888::TRANSPARENT,
        ]
    }
}

/// Weighted per-channel average, truncating.
fn blend(a: Color888, b: Color888, wa: u16, wb: u16) -> Color8888 {
    let channel = |x: u8, y: u8| ((x as u16 * wa + y as u16 * wb) / (wa + wb)) as u8;
    Color8888::rgb(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b))
}

/// Build the DXT5 alpha ramp from two reference alphas.
///
/// `a0 > a1` interpolates six intermediate values; otherwise four are
/// interpolated and the last two entries are fixed at 0 and 255.
pub fn alpha_ramp(a0: u8, a1: u8) -> [u8; 8] {
    let (a0_w, a1_w) = (a0 as u32, a1 as u32);
    let mut ramp = [a0, a1, 0, 0, 0, 0, 0, 0];

    if a0 > a1 {
        for i in 0..6u32 {
            ramp[i as usize + 2] = (((6 - i) * a0_w + (1 + i) * a1_w + 3) / 7) as u8;
        }
    } else {
        for i in 0..4u32 {
            ramp[i as usize + 2] = (((4 - i) * a0_w + (1 + i) * a1_w + 2) / 5) as u8;
        }
        ramp[6] = 0x00;
        ramp[7] = 0xFF;
    }

    ramp
}

/// A borrowed view over one compressed block.
#[derive(Debug, Clone, Copy)]
pub enum DxtBlock<'a> {
    Dxt1(&'a Dxt1Block),
    Dxt3(&'a Dxt3Block),
    Dxt5(&'a Dxt5Block),
}

impl<'a> DxtBlock<'a> {
    /// View the first `format.bytes_per_block()` bytes of `bytes` as a block.
    pub fn parse(format: DxtFormat, bytes: &'a [u8]) -> Result<Self> {
        Ok(match format {
            DxtFormat::Dxt1 => DxtBlock::Dxt1(view(bytes)?),
            DxtFormat::Dxt3 => DxtBlock::Dxt3(view(bytes)?),
            DxtFormat::Dxt5 => DxtBlock::Dxt5(view(bytes)?),
        })
    }

    pub fn format(&self) -> DxtFormat {
        match self {
            DxtBlock::Dxt1(_) => DxtFormat::Dxt1,
            DxtBlock::Dxt3(_) => DxtFormat::Dxt3,
            DxtBlock::Dxt5(_) => DxtFormat::Dxt5,
        }
    }

    pub fn color_block(&self) -> &'a ColorBlock {
        match self {
            DxtBlock::Dxt1(b) => &b.color,
            DxtBlock::Dxt3(b) => &b.color,
            DxtBlock::Dxt5(b) => &b.color,
        }
    }

    /// Decode all 16 texels in row-major order.
    pub fn decode(&self) -> [Color8888; 16] {
        let color = self.color_block();
        let palette = block_palette(color, self.format() == DxtFormat::Dxt1);

        let mut texels = [Color8888::TRANSPARENT; 16];
        for y in 0..4 {
            for x in 0..4 {
                texels[y * 4 + x] = palette[color.index_at(x, y)];
            }
        }

        match *self {
            DxtBlock::Dxt1(_) => {}
            DxtBlock::Dxt3(block) => {
                apply_alpha(&mut texels, |x, y| block.alpha.alpha_at(x, y));
            }
            DxtBlock::Dxt5(block) => {
                let ramp = block.alpha.ramp();
                apply_alpha(&mut texels, |x, y| ramp[block.alpha.index_at(x, y)]);
            }
        }

        texels
    }
}

fn apply_alpha(texels: &mut [Color8888; 16], alpha: impl Fn(usize, usize) -> u8) {
    for y in 0..4 {
        for x in 0..4 {
            texels[y * 4 + x].a = alpha(x, y);
        }
    }
}

fn view<T: FromBytes + KnownLayout + Immutable>(bytes: &[u8]) -> Result<&T> {
    T::ref_from_prefix(bytes)
        .map(|(block, _)| block)
        .map_err(|_| {
            Error::Common(retex_common::Error::Truncated {
                needed: size_of::<T>(),
                available: bytes.len(),
            })
        })
}
