//! Color tables for 8-bit images.

use crate::{Error, Result};

/// An 8-bit per channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Create an opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Create a color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// The color as `[r, g, b, a]` bytes.
    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// An ordered table of up to 256 colors addressed by an 8-bit index.
///
/// Entries that were never assigned read as opaque black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    /// The most entries an 8-bit index can address.
    pub const MAX_ENTRIES: usize = 256;

    /// Create a palette of `len` opaque black entries.
    pub fn new(len: usize) -> Result<Self> {
        if len > Self::MAX_ENTRIES {
            return Err(Error::PaletteTooLarge {
                max: Self::MAX_ENTRIES,
                actual: len,
            });
        }
        Ok(Self {
            entries: vec![Color::BLACK; len],
        })
    }

    /// Create a palette from existing entries.
    pub fn from_colors(entries: Vec<Color>) -> Result<Self> {
        if entries.len() > Self::MAX_ENTRIES {
            return Err(Error::PaletteTooLarge {
                max: Self::MAX_ENTRIES,
                actual: entries.len(),
            });
        }
        Ok(Self { entries })
    }

    /// A 256 entry linear grey ramp where entry `i` is `(i, i, i)`.
    pub fn greyscale() -> Self {
        let entries = (0..=u8::MAX).map(|i| Color::rgb(i, i, i)).collect();
        Self { entries }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the palette has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry; indices past the end read as opaque black.
    #[inline]
    pub fn get(&self, index: u8) -> Color {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or(Color::BLACK)
    }

    /// Mutable access to an existing entry.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Color> {
        self.entries.get_mut(index)
    }

    /// All entries in index order.
    #[inline]
    pub fn entries(&self) -> &[Color] {
        &self.entries
    }
}
