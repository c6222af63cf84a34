//! Packed color representations used by DXT blocks.
//!
//! Channel widening uses `channel * 255 / max`, not bit replication. The two
//! disagree for some inputs (5-bit 16 widens to 131 here, replication gives
//! 132), and decoded output must match the multiply-divide form exactly.

pub use retex_common::Color as Color8888;

/// A 16-bit color with 5 bits red (high), 6 bits green and 5 bits blue (low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color565(pub u16);

impl Color565 {
    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 11) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        ((self.0 >> 5) & 0x3F) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        (self.0 & 0x1F) as u8
    }

    /// Widen each channel to 8 bits.
    #[inline]
    pub const fn to_color888(self) -> Color888 {
        Color888 {
            r: scale5(self.red()),
            g: scale6(self.green()),
            b: scale5(self.blue()),
        }
    }
}

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color888 {
    /// Attach an alpha value.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Color8888 {
        Color8888::rgba(self.r, self.g, self.b, a)
    }
}

/// Widen a 5-bit channel to 8 bits.
#[inline]
pub const fn scale5(channel: u8) -> u8 {
    (channel as u32 * 0xFF / 0x1F) as u8
}

/// Widen a 6-bit channel to 8 bits.
#[inline]
pub const fn scale6(channel: u8) -> u8 {
    (channel as u32 * 0xFF / 0x3F) as u8
}

/// Widen a 4-bit channel to 8 bits.
#[inline]
pub const fn scale4(channel: u8) -> u8 {
    (channel as u32 * 0xFF / 0x0F) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale5_all_inputs() {
        for c in 0..32u8 {
            assert_eq!(scale5(c) as u32, c as u32 * 255 / 31);
        }
        assert_eq!(scale5(0), 0);
        assert_eq!(scale5(16), 131);
        assert_eq!(scale5(31), 255);
    }

    #[test]
    fn test_scale6_all_inputs() {
        for c in 0..64u8 {
            assert_eq!(scale6(c) as u32, c as u32 * 255 / 63);
        }
        assert_eq!(scale6(32), 129);
        assert_eq!(scale6(63), 255);
    }

    #[test]
    fn test_scale_differs_from_bit_replication() {
        // (16 << 3) | (16 >> 2) == 132
        assert_ne!(scale5(16), (16 << 3) | (16 >> 2));
    }

    #[test]
    fn test_channel_extraction() {
        let red = Color565(0xF800);
        assert_eq!((red.red(), red.green(), red.blue()), (31, 0, 0));
        assert_eq!(red.to_color888(), Color888 { r: 255, g: 0, b: 0 });

        let green = Color565(0x07E0);
        assert_eq!(green.to_color888(), Color888 { r: 0, g: 255, b: 0 });

        let blue = Color565(0x001F);
        assert_eq!(blue.to_color888(), Color888 { r: 0, g: 0, b: 255 });
    }
}
