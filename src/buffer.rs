//! Image geometry and length-checked buffer validation.
//!
//! Buffers are plain slices owned by the caller. Every entry point builds a
//! `Geometry` first and checks each slice against it before touching pixels.

use crate::error::{Error, Result};

/// Number of bytes in one RGBA pixel.
pub const RGBA_BYTES: usize = 4;

/// Width and height of a raster, both nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: u32,
    height: u32,
    pixels: usize,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry { width, height });
        }
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .filter(|n| n.checked_mul(RGBA_BYTES).is_some())
            .ok_or(Error::InvalidGeometry { width, height })?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// `width * height`.
    #[inline]
    pub fn pixels(&self) -> usize {
        self.pixels
    }

    /// Require an RGBA byte buffer covering every pixel.
    pub fn check_rgba(&self, what: &'static str, len: usize) -> Result<()> {
        require(what, self.pixels * RGBA_BYTES, len)
    }

    /// Require a one-sample-per-pixel plane.
    pub fn check_plane(&self, what: &'static str, len: usize) -> Result<()> {
        require(what, self.pixels, len)
    }
}

/// Fail with `BufferTooSmall` unless `actual >= required`.
#[inline]
pub fn require(what: &'static str, required: usize, actual: usize) -> Result<()> {
    if actual < required {
        return Err(Error::BufferTooSmall {
            what,
            required,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            Geometry::new(0, 4),
            Err(Error::InvalidGeometry {
                width: 0,
                height: 4
            })
        );
        assert!(Geometry::new(4, 0).is_err());
    }

    #[test]
    fn test_checks() {
        let g = Geometry::new(3, 2).unwrap();
        assert_eq!(g.pixels(), 6);
        assert!(g.check_rgba("image", 24).is_ok());
        assert!(g.check_rgba("image", 100).is_ok());
        assert_eq!(
            g.check_rgba("image", 23),
            Err(Error::BufferTooSmall {
                what: "image",
                required: 24,
                actual: 23
            })
        );
        assert!(g.check_plane("plane", 6).is_ok());
        assert!(g.check_plane("plane", 5).is_err());
    }
}
