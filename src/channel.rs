//! Extraction of a 16-bit brightness channel from RGBA pixels.
//!
//! The unsharp mask works on one scalar channel: HSL lightness or HSV
//! value, depending on the [`ColorModel`]. Alpha never contributes.

use core::fmt;
use core::str::FromStr;

use crate::buffer::Geometry;
use crate::error::{Error, Result};

/// Color model the unsharp mask sharpens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorModel {
    /// Sharpen HSL lightness, recomposing through the full HSL transform.
    #[default]
    Hsl,
    /// Sharpen HSV value by scaling R, G and B uniformly.
    Hsv,
}

impl ColorModel {
    /// The brightness channel of one pixel in this model.
    #[inline]
    pub fn channel16(self, r: u8, g: u8, b: u8) -> u16 {
        match self {
            Self::Hsl => lightness16(r, g, b),
            Self::Hsv => value16(r, g, b),
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hsl => write!(f, "hsl"),
            Self::Hsv => write!(f, "hsv"),
        }
    }
}

impl FromStr for ColorModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hsl" | "lightness" => Ok(Self::Hsl),
            "hsv" | "value" => Ok(Self::Hsv),
            _ => Err(Error::UnknownColorModel { name: s.to_string() }),
        }
    }
}

/// HSL lightness scaled to `[0, 65535]`.
#[inline]
pub fn lightness16(r: u8, g: u8, b: u8) -> u16 {
    let max = r.max(g).max(b) as u32;
    let min = r.min(g).min(b) as u32;
    (((max + min) * 257) >> 1) as u16
}

/// HSV value scaled to `[0, 65280]` in steps of 256.
#[inline]
pub fn value16(r: u8, g: u8, b: u8) -> u16 {
    (r.max(g).max(b) as u16) << 8
}

fn extract_with(
    src_rgba: &[u8],
    dst: &mut [u16],
    width: u32,
    height: u32,
    f: fn(u8, u8, u8) -> u16,
) -> Result<()> {
    let g = Geometry::new(width, height)?;
    g.check_rgba("channel source image", src_rgba.len())?;
    g.check_plane("channel destination plane", dst.len())?;

    for (px, out) in src_rgba.chunks_exact(4).zip(dst.iter_mut()).take(g.pixels()) {
        *out = f(px[0], px[1], px[2]);
    }
    Ok(())
}

/// Fill `dst` with the HSL lightness of each pixel of `src_rgba`.
pub fn extract_lightness(src_rgba: &[u8], dst: &mut [u16], width: u32, height: u32) -> Result<()> {
    log::debug!("extract_lightness: {width}x{height}");
    extract_with(src_rgba, dst, width, height, lightness16)
}

/// Fill `dst` with the HSV value of each pixel of `src_rgba`.
pub fn extract_value(src_rgba: &[u8], dst: &mut [u16], width: u32, height: u32) -> Result<()> {
    log::debug!("extract_value: {width}x{height}");
    extract_with(src_rgba, dst, width, height, value16)
}

/// Extract the channel `model` sharpens in.
pub fn extract(
    model: ColorModel,
    src_rgba: &[u8],
    dst: &mut [u16],
    width: u32,
    height: u32,
) -> Result<()> {
    match model {
        ColorModel::Hsl => extract_lightness(src_rgba, dst, width, height),
        ColorModel::Hsv => extract_value(src_rgba, dst, width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lightness_values() {
        assert_eq!(lightness16(0, 0, 0), 0);
        assert_eq!(lightness16(255, 255, 255), 65535);
        assert_eq!(lightness16(255, 0, 0), 32767);
        assert_eq!(lightness16(10, 200, 30), ((210 * 257) >> 1) as u16);
    }

    #[test]
    fn test_value_values() {
        assert_eq!(value16(0, 0, 0), 0);
        assert_eq!(value16(255, 255, 255), 0xff00);
        assert_eq!(value16(3, 9, 1), 9 << 8);
    }

    #[test]
    fn test_alpha_and_position_ignored() {
        let src = [
            10, 20, 30, 0, //
            10, 20, 30, 255, //
            10, 20, 30, 77, //
        ];
        let mut l = [0u16; 3];
        let mut v = [0u16; 3];
        extract_lightness(&src, &mut l, 3, 1).unwrap();
        extract_value(&src, &mut v, 1, 3).unwrap();
        assert!(l.iter().all(|&x| x == lightness16(10, 20, 30)));
        assert!(v.iter().all(|&x| x == 30 << 8));
    }

    #[test]
    fn test_dispatch_by_model() {
        let src = [200, 100, 50, 255];
        let mut out = [0u16; 1];
        extract(ColorModel::Hsv, &src, &mut out, 1, 1).unwrap();
        assert_eq!(out[0], ColorModel::Hsv.channel16(200, 100, 50));
        extract(ColorModel::Hsl, &src, &mut out, 1, 1).unwrap();
        assert_eq!(out[0], ColorModel::Hsl.channel16(200, 100, 50));
    }

    #[test]
    fn test_short_buffers_rejected() {
        let src = [0u8; 15];
        let mut out = [0u16; 4];
        assert!(extract_lightness(&src, &mut out, 2, 2).is_err());
        let src = [0u8; 16];
        let mut out = [0u16; 3];
        assert!(extract_value(&src, &mut out, 2, 2).is_err());
    }

    #[test]
    fn test_model_parse_and_display() {
        assert_eq!("HSV".parse::<ColorModel>(), Ok(ColorModel::Hsv));
        assert_eq!("lightness".parse::<ColorModel>(), Ok(ColorModel::Hsl));
        assert_eq!(
            "lab".parse::<ColorModel>(),
            Err(Error::UnknownColorModel {
                name: "lab".to_string()
            })
        );
        assert_eq!(ColorModel::Hsl.to_string(), "hsl");
        assert_eq!(ColorModel::default(), ColorModel::Hsl);
    }
}
