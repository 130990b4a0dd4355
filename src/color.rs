//! Pixel and color-model types.
//!
//! `Rgba8` is one packed pixel; channel order is R, G, B, A from the least
//! to the most significant byte of the little-endian `u32`, which is the
//! same as R, G, B, A byte order in memory.
//!
//! `Hsl16` is an integer HSL representation: hue on a 16-bit circle,
//! saturation in 12 bits, lightness in 16 bits.

// ============================================================================
// Rgba8
// ============================================================================

/// RGBA color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack from a little-endian RGBA word.
    #[inline]
    pub fn from_packed(rgba: u32) -> Self {
        Self {
            r: rgba as u8,
            g: (rgba >> 8) as u8,
            b: (rgba >> 16) as u8,
            a: (rgba >> 24) as u8,
        }
    }

    #[inline]
    pub fn to_packed(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16 | (self.a as u32) << 24
    }

    /// Read pixel `i` from an RGBA byte buffer.
    #[inline]
    pub fn load(buf: &[u8], i: usize) -> Self {
        let p = &buf[i * 4..i * 4 + 4];
        Self::new(p[0], p[1], p[2], p[3])
    }

    /// Write pixel `i` into an RGBA byte buffer.
    #[inline]
    pub fn store(self, buf: &mut [u8], i: usize) {
        let p = &mut buf[i * 4..i * 4 + 4];
        p[0] = self.r;
        p[1] = self.g;
        p[2] = self.b;
        p[3] = self.a;
    }

    #[inline]
    pub fn max_rgb(self) -> u8 {
        self.r.max(self.g).max(self.b)
    }

    #[inline]
    pub fn min_rgb(self) -> u8 {
        self.r.min(self.g).min(self.b)
    }
}

// ============================================================================
// Hsl16
// ============================================================================

const HUE_THIRD: i32 = 0x5555; // 0xffff / 3
const HUE_TWO_THIRDS: u16 = 0xaaaa;
const HUE_HALF: u16 = 0x7fff;
const HUE_SIXTH: u16 = 0x2aaa;
const SAT_MAX: i32 = 0xfff;

/// Fixed-point HSL color.
///
/// Hue may be computed from a negative intermediate; it is stored modulo
/// 2^16 and the inverse transform treats it as circular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl16 {
    pub h: u16,
    pub s: u16,
    pub l: i32,
}

impl Hsl16 {
    /// Forward transform. All divisions truncate toward zero.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = ((max + min) * 257) >> 1;

        if min == max {
            return Self { h: 0, s: 0, l };
        }

        let delta = max - min;
        let s = if l <= 0x7fff {
            delta * SAT_MAX / (max + min)
        } else {
            delta * SAT_MAX / (2 * 0xff - max - min)
        };
        let h = if r == max {
            (g - b) * 0xffff / (6 * delta)
        } else if g == max {
            HUE_THIRD + (b - r) * 0xffff / (6 * delta)
        } else {
            2 * HUE_THIRD + (r - g) * 0xffff / (6 * delta)
        };

        Self {
            h: h as u16,
            s: s as u16,
            l,
        }
    }

    /// Inverse transform. Lightness must already be in `[0, 0xffff]`.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        if self.s == 0 {
            let v = (self.l >> 8) as u8;
            return (v, v, v);
        }

        let l = self.l as u32;
        let s = self.s as u32;
        let m2 = if l <= 0x7fff {
            (l * (0x1000 + s) + 0x800) >> 12
        } else {
            l + (((0xffff - l) * s + 0x800) >> 12)
        };
        let m1 = ((2 * l).wrapping_sub(m2)) >> 8;
        let m2 = m2 >> 8;

        let r = hue_to_channel(m1, m2, self.h.wrapping_add(HUE_THIRD as u16));
        let g = hue_to_channel(m1, m2, self.h);
        let b = hue_to_channel(m1, m2, self.h.wrapping_sub(HUE_THIRD as u16));
        (r, g, b)
    }
}

/// Piecewise-linear hue ramp between `m1` and `m2`.
#[inline]
fn hue_to_channel(m1: u32, m2: u32, h: u16) -> u8 {
    let v = if h >= HUE_TWO_THIRDS {
        m1
    } else if h >= HUE_HALF {
        m1 + (((m2 - m1) * 6 * (HUE_TWO_THIRDS - h) as u32 + 0x8000) >> 16)
    } else if h >= HUE_SIXTH {
        m2
    } else {
        m1 + (((m2 - m1) * 6 * h as u32 + 0x8000) >> 16)
    };
    v as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_channel_order() {
        let c = Rgba8::from_packed(0x4433_2211);
        assert_eq!(c, Rgba8::new(0x11, 0x22, 0x33, 0x44));
        assert_eq!(c.to_packed(), 0x4433_2211);
        assert_eq!(c.to_packed().to_le_bytes(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_load_store() {
        let mut buf = [0u8; 8];
        Rgba8::new(1, 2, 3, 4).store(&mut buf, 1);
        assert_eq!(buf, [0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(Rgba8::load(&buf, 1), Rgba8::new(1, 2, 3, 4));
    }

    #[test]
    fn test_gray_has_no_hue() {
        let hsl = Hsl16::from_rgb(100, 100, 100);
        assert_eq!(hsl.h, 0);
        assert_eq!(hsl.s, 0);
        assert_eq!(hsl.l, (200 * 257) >> 1);
        assert_eq!(hsl.to_rgb(), (100, 100, 100));
    }

    #[test]
    fn test_gray_recomposes_from_lightness_only() {
        let hsl = Hsl16 {
            h: 0x1234,
            s: 0,
            l: 0x80ff,
        };
        assert_eq!(hsl.to_rgb(), (0x80, 0x80, 0x80));
    }

    #[test]
    fn test_primaries_round_trip() {
        for (r, g, b) in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (255, 255, 0), (0, 255, 255)] {
            assert_eq!(Hsl16::from_rgb(r, g, b).to_rgb(), (r, g, b), "rgb({r},{g},{b})");
        }
    }

    #[test]
    fn test_red_hue_and_saturation() {
        let hsl = Hsl16::from_rgb(255, 0, 0);
        assert_eq!(hsl.h, 0);
        assert_eq!(hsl.s, 0xfff);
        assert_eq!(hsl.l, 32767);
    }

    #[test]
    fn test_negative_hue_wraps() {
        // r is max and b > g, so the raw hue is negative
        let hsl = Hsl16::from_rgb(200, 10, 50);
        assert!(hsl.h > 0x8000);
        let (r, g, b) = hsl.to_rgb();
        assert!((r as i32 - 200).abs() <= 1);
        assert!((g as i32 - 10).abs() <= 1);
        assert!((b as i32 - 50).abs() <= 1);
    }
}
