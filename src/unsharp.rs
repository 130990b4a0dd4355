//! Unsharp-mask compositing.
//!
//! Compares a brightness plane with its blurred copy and, where the
//! difference reaches the threshold, pushes the pixel's brightness further
//! away from the blurred value. The color model decides how the new
//! brightness is put back into RGB:
//!
//! - [`ColorModel::Hsl`]: full fixed-point HSL round trip on lightness.
//! - [`ColorModel::Hsv`]: value is scaled, and since scaling V scales R, G
//!   and B by the same factor, the pixel is multiplied directly.
//!
//! All arithmetic is integer with explicit rounding constants, so results
//! are bit-exact across platforms.

use crate::basics::{amount_to_q12, q12_scale, Q12_HALF, Q12_SHIFT, LIGHTNESS_MAX, VALUE_MAX};
use crate::buffer::Geometry;
use crate::channel::ColorModel;
use crate::color::{Hsl16, Rgba8};
use crate::error::Result;

// ============================================================================
// Parameters
// ============================================================================

/// User-facing unsharp-mask settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpParams {
    /// Strength in percent; 0 disables sharpening.
    pub amount: u32,
    /// Gaussian blur radius in pixels; 0 disables sharpening.
    pub radius: f32,
    /// Minimum brightness difference, on a 0..=255 scale, that gets sharpened.
    pub threshold: u8,
    pub model: ColorModel,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            amount: 80,
            radius: 0.6,
            threshold: 2,
            model: ColorModel::Hsl,
        }
    }
}

impl UnsharpParams {
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_model(mut self, model: ColorModel) -> Self {
        self.model = model;
        self
    }

    /// True when these settings cannot change any pixel.
    pub fn is_noop(&self) -> bool {
        self.amount == 0 || !(self.radius > 0.0)
    }

    pub fn mask(&self) -> UnsharpMask {
        UnsharpMask::new(self.model, self.amount, self.threshold)
    }
}

// ============================================================================
// UnsharpMask
// ============================================================================

/// Fixed-point form of the compositing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsharpMask {
    model: ColorModel,
    amount_fp: i32,
    threshold_fp: i32,
}

impl UnsharpMask {
    pub fn new(model: ColorModel, amount_percent: u32, threshold: u8) -> Self {
        let threshold_fp = match model {
            ColorModel::Hsl => threshold as i32 * 257,
            ColorModel::Hsv => (threshold as i32) << 8,
        };
        Self {
            model,
            amount_fp: amount_to_q12(amount_percent),
            threshold_fp,
        }
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Amount as a Q12 multiplier (`100%` is `4096`).
    pub fn amount_fixed(&self) -> i32 {
        self.amount_fp
    }

    /// Threshold on the channel's 16-bit scale.
    pub fn threshold_fixed(&self) -> i32 {
        self.threshold_fp
    }

    /// Signed difference between a channel sample and its blurred copy.
    ///
    /// Lightness differences are doubled; value differences are not.
    #[inline]
    pub fn diff(&self, channel: u16, blurred: u16) -> i32 {
        let d = channel as i32 - blurred as i32;
        match self.model {
            ColorModel::Hsl => 2 * d,
            ColorModel::Hsv => d,
        }
    }

    /// Whether a difference is large enough to sharpen.
    #[inline]
    pub fn passes(&self, diff: i32) -> bool {
        diff.abs() >= self.threshold_fp
    }

    /// New channel value after adding the amplified difference, clamped to
    /// the channel range.
    #[inline]
    pub fn adjust(&self, channel: i32, diff: i32) -> i32 {
        let max = match self.model {
            ColorModel::Hsl => LIGHTNESS_MAX,
            ColorModel::Hsv => VALUE_MAX,
        };
        channel
            .saturating_add(q12_scale(self.amount_fp, diff))
            .clamp(0, max)
    }

    /// Sharpen one pixel, or `None` if it stays as it is.
    ///
    /// Alpha is carried through unchanged.
    pub fn sharpen_pixel(&self, px: Rgba8, channel: u16, blurred: u16) -> Option<Rgba8> {
        let diff = self.diff(channel, blurred);
        if !self.passes(diff) {
            return None;
        }
        let (r, g, b) = match self.model {
            ColorModel::Hsl => self.sharpen_hsl(px, diff),
            ColorModel::Hsv => self.sharpen_hsv(px, channel, diff),
        };
        Some(Rgba8::new(r, g, b, px.a))
    }

    /// Lightness is taken from the pixel itself; only the difference comes
    /// from the planes.
    fn sharpen_hsl(&self, px: Rgba8, diff: i32) -> (u8, u8, u8) {
        let mut hsl = Hsl16::from_rgb(px.r, px.g, px.b);
        hsl.l = self.adjust(hsl.l, diff);
        hsl.to_rgb()
    }

    fn sharpen_hsv(&self, px: Rgba8, value: u16, diff: i32) -> (u8, u8, u8) {
        let v1 = value as i32;
        let v2 = self.adjust(v1, diff);
        // V = 0 is black; any multiplier leaves it black.
        let v1 = if v1 != 0 { v1 } else { 1 };
        let vmul = ((v2 << Q12_SHIFT) / v1) as u64;

        let scale = |c: u8| ((c as u64 * vmul + Q12_HALF as u64) >> Q12_SHIFT).min(255) as u8;
        (scale(px.r), scale(px.g), scale(px.b))
    }

    fn check(
        &self,
        g: &Geometry,
        image_len: usize,
        plane_len: usize,
        blurred_len: usize,
    ) -> Result<()> {
        g.check_rgba("unsharp image", image_len)?;
        g.check_plane("unsharp channel plane", plane_len)?;
        g.check_plane("unsharp blurred plane", blurred_len)
    }

    /// Sharpen `img` in place. Returns the number of pixels rewritten.
    pub fn apply_in_place(
        &self,
        img: &mut [u8],
        plane: &[u16],
        blurred: &[u16],
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let g = Geometry::new(width, height)?;
        self.check(&g, img.len(), plane.len(), blurred.len())?;
        log::debug!(
            "unsharp ({}): {width}x{height}, amount_fp {}, threshold_fp {}",
            self.model,
            self.amount_fp,
            self.threshold_fp
        );
        if self.amount_fp == 0 {
            return Ok(0);
        }

        let mut changed = 0;
        for i in 0..g.pixels() {
            if let Some(px) = self.sharpen_pixel(Rgba8::load(img, i), plane[i], blurred[i]) {
                px.store(img, i);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Sharpen `src` into `dst`. Pixels below the threshold are copied
    /// unchanged, so `dst` is complete afterwards.
    pub fn apply_into(
        &self,
        src: &[u8],
        dst: &mut [u8],
        plane: &[u16],
        blurred: &[u16],
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let g = Geometry::new(width, height)?;
        self.check(&g, src.len(), plane.len(), blurred.len())?;
        g.check_rgba("unsharp destination image", dst.len())?;
        log::debug!("unsharp_into ({}): {width}x{height}", self.model);

        let n = g.pixels() * 4;
        if self.amount_fp == 0 {
            dst[..n].copy_from_slice(&src[..n]);
            return Ok(0);
        }

        let mut changed = 0;
        for i in 0..g.pixels() {
            let px = Rgba8::load(src, i);
            match self.sharpen_pixel(px, plane[i], blurred[i]) {
                Some(out) => {
                    out.store(dst, i);
                    changed += 1;
                }
                None => px.store(dst, i),
            }
        }
        Ok(changed)
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Sharpen lightness in place. `lightness` comes from
/// [`extract_lightness`](crate::channel::extract_lightness).
pub fn apply_unsharp_lightness(
    img: &mut [u8],
    lightness: &[u16],
    blurred: &[u16],
    width: u32,
    height: u32,
    amount_percent: u32,
    threshold: u8,
) -> Result<usize> {
    UnsharpMask::new(ColorModel::Hsl, amount_percent, threshold)
        .apply_in_place(img, lightness, blurred, width, height)
}

/// Sharpen value in place. `value` comes from
/// [`extract_value`](crate::channel::extract_value).
pub fn apply_unsharp_value(
    img: &mut [u8],
    value: &[u16],
    blurred: &[u16],
    width: u32,
    height: u32,
    amount_percent: u32,
    threshold: u8,
) -> Result<usize> {
    UnsharpMask::new(ColorModel::Hsv, amount_percent, threshold)
        .apply_in_place(img, value, blurred, width, height)
}

/// Sharpen `img` in place with `params`, given its channel plane and the
/// blurred plane. The radius in `params` is not used here.
pub fn unsharp_in_place(
    img: &mut [u8],
    plane: &[u16],
    blurred: &[u16],
    width: u32,
    height: u32,
    params: &UnsharpParams,
) -> Result<usize> {
    params.mask().apply_in_place(img, plane, blurred, width, height)
}

/// [`unsharp_in_place`] writing into `dst` and leaving `src` as it is.
pub fn unsharp_into(
    src: &[u8],
    dst: &mut [u8],
    plane: &[u16],
    blurred: &[u16],
    width: u32,
    height: u32,
    params: &UnsharpParams,
) -> Result<usize> {
    params.mask().apply_into(src, dst, plane, blurred, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{lightness16, value16};

    fn planes(img: &[u8], model: ColorModel) -> Vec<u16> {
        img.chunks_exact(4)
            .map(|p| model.channel16(p[0], p[1], p[2]))
            .collect()
    }

    #[test]
    fn test_fixed_point_parameters() {
        let m = UnsharpMask::new(ColorModel::Hsl, 100, 10);
        assert_eq!(m.amount_fixed(), 4096);
        assert_eq!(m.threshold_fixed(), 2570);
        let m = UnsharpMask::new(ColorModel::Hsv, 100, 10);
        assert_eq!(m.threshold_fixed(), 2560);
    }

    #[test]
    fn test_lightness_adjustment_formula() {
        let m = UnsharpMask::new(ColorModel::Hsl, 100, 0);
        let diff = m.diff(40000, 35000);
        assert_eq!(diff, 10000);
        // (4096 * 10000 + 2048) >> 12
        assert_eq!(m.adjust(40000, diff), 40000 + 10000);
        assert_eq!(m.adjust(60000, diff), 65535);
        assert_eq!(m.adjust(5000, -diff), 0);
    }

    #[test]
    fn test_gray_pixel_lightness_path() {
        let m = UnsharpMask::new(ColorModel::Hsl, 100, 0);
        let px = Rgba8::new(156, 156, 156, 90);
        let out = m.sharpen_pixel(px, 40000, 35000).unwrap();
        // l = 40092 + 10000, gray recomposes as l >> 8
        assert_eq!(out, Rgba8::new(195, 195, 195, 90));
    }

    #[test]
    fn test_below_threshold_untouched() {
        let m = UnsharpMask::new(ColorModel::Hsl, 300, 4);
        // 2 * 500 = 1000 < 4 * 257
        assert!(m
            .sharpen_pixel(Rgba8::new(10, 200, 30, 255), 30000, 29500)
            .is_none());
        let m = UnsharpMask::new(ColorModel::Hsv, 300, 4);
        assert!(m
            .sharpen_pixel(Rgba8::new(10, 200, 30, 255), 30000, 29000)
            .is_none());
        // exactly at the threshold is sharpened
        assert!(m
            .sharpen_pixel(Rgba8::new(10, 200, 30, 255), 30000, 28976)
            .is_some());
    }

    #[test]
    fn test_value_scales_rgb_uniformly() {
        let m = UnsharpMask::new(ColorModel::Hsv, 100, 0);
        let px = Rgba8::new(100, 50, 25, 200);
        let v = value16(100, 50, 25);
        // v = 25600, blurred 20480 -> v2 = 30720, vmul = 4915
        let out = m.sharpen_pixel(px, v, 20480).unwrap();
        assert_eq!(out, Rgba8::new(120, 60, 30, 200));
    }

    #[test]
    fn test_value_black_pixel_stays_black() {
        let m = UnsharpMask::new(ColorModel::Hsv, 500, 0);
        let out = m.sharpen_pixel(Rgba8::new(0, 0, 0, 255), 0, 9000).unwrap();
        assert_eq!(out, Rgba8::new(0, 0, 0, 255));
    }

    #[test]
    fn test_value_clamped_to_white() {
        let m = UnsharpMask::new(ColorModel::Hsv, 500, 0);
        let px = Rgba8::new(250, 125, 0, 255);
        let out = m.sharpen_pixel(px, value16(250, 125, 0), 30000).unwrap();
        // v2 saturates at 0xff00, vmul = (0xff00 << 12) / 64000 = 4177
        assert_eq!(out.r, 255);
        assert_eq!(out.g, 127);
        assert_eq!(out.b, 0);
    }

    #[test]
    fn test_huge_amount_saturates() {
        let hsl = UnsharpMask::new(ColorModel::Hsl, u32::MAX, 0);
        assert_eq!(hsl.amount_fixed(), i32::MAX);
        assert_eq!(hsl.adjust(65535, 131070), 65535);
        assert_eq!(hsl.adjust(65535, 65536), 65535);
        assert_eq!(hsl.adjust(65535, 30000), 65535);
        assert_eq!(hsl.adjust(0, 2), 65535);
        assert_eq!(hsl.adjust(65535, -131070), 0);

        let hsv = UnsharpMask::new(ColorModel::Hsv, u32::MAX, 0);
        assert_eq!(hsv.adjust(0xff00, 30000), 0xff00);
        assert_eq!(hsv.adjust(0xff00, -30000), 0);
    }

    #[test]
    fn test_value_scale_saturates_on_mismatched_plane() {
        // The plane claims V = 256 for a pixel whose real V is 255 << 8, so
        // doubling the plane value would push R past 255.
        let m = UnsharpMask::new(ColorModel::Hsv, 100, 0);
        let px = Rgba8::new(255, 100, 0, 255);
        let out = m.sharpen_pixel(px, 256, 0).unwrap();
        assert_eq!(out.r, 255);
        assert_eq!(out.g, 200);
        assert_eq!(out.b, 0);
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let img: Vec<u8> = (0..64u32).map(|i| (i * 37 % 256) as u8).collect();
        for model in [ColorModel::Hsl, ColorModel::Hsv] {
            let plane = planes(&img, model);
            let blurred = vec![0u16; 16];
            let mut out = img.clone();
            let n = UnsharpMask::new(model, 0, 0)
                .apply_in_place(&mut out, &plane, &blurred, 4, 4)
                .unwrap();
            assert_eq!(n, 0);
            assert_eq!(out, img);

            let mut dst = vec![0u8; 64];
            UnsharpMask::new(model, 0, 0)
                .apply_into(&img, &mut dst, &plane, &blurred, 4, 4)
                .unwrap();
            assert_eq!(dst, img);
        }
    }

    #[test]
    fn test_into_copies_untouched_pixels() {
        let img = [
            10, 20, 30, 40, //
            200, 100, 50, 255, //
        ];
        let plane = planes(&img, ColorModel::Hsl);
        // first pixel matches its blur, second is brighter than its blur
        let blurred = [plane[0], plane[1] - 3000];
        let mut dst = [0u8; 8];
        let n = UnsharpMask::new(ColorModel::Hsl, 100, 1)
            .apply_into(&img, &mut dst, &plane, &blurred, 2, 1)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(&dst[..4], &img[..4]);
        assert_eq!(dst[7], 255);
        let before = lightness16(img[4], img[5], img[6]);
        let after = lightness16(dst[4], dst[5], dst[6]);
        assert!(after > before);
    }

    #[test]
    fn test_in_place_matches_into() {
        let img: Vec<u8> = (0..36u32).map(|i| (i * 71 % 256) as u8).collect();
        for model in [ColorModel::Hsl, ColorModel::Hsv] {
            let plane = planes(&img, model);
            let blurred: Vec<u16> = plane.iter().map(|&v| v / 2 + 1000).collect();
            let mask = UnsharpMask::new(model, 150, 3);

            let mut a = img.clone();
            mask.apply_in_place(&mut a, &plane, &blurred, 3, 3).unwrap();
            let mut b = vec![0u8; 36];
            mask.apply_into(&img, &mut b, &plane, &blurred, 3, 3).unwrap();
            assert_eq!(a, b, "{model}");
        }
    }

    #[test]
    fn test_free_functions() {
        let mut img = [120, 120, 120, 255];
        let l = [lightness16(120, 120, 120)];
        let n = apply_unsharp_lightness(&mut img, &l, &[0], 1, 1, 50, 0).unwrap();
        assert_eq!(n, 1);
        assert!(img[0] > 120);

        let mut img = [120, 60, 30, 255];
        let v = [value16(120, 60, 30)];
        apply_unsharp_value(&mut img, &v, &[v[0] + 2560], 1, 1, 100, 0).unwrap();
        assert!(img[0] < 120);
        assert_eq!(img[3], 255);

        let params = UnsharpParams::default().with_amount(50).with_threshold(0);
        let src = [120, 120, 120, 255];
        let mut dst = [0u8; 4];
        unsharp_into(&src, &mut dst, &l, &[0], 1, 1, &params).unwrap();
        let mut img = src;
        unsharp_in_place(&mut img, &l, &[0], 1, 1, &params).unwrap();
        assert_eq!(dst, img);
        assert!(img[0] > 120);
    }

    #[test]
    fn test_params_defaults_and_builders() {
        let p = UnsharpParams::default();
        assert_eq!((p.amount, p.threshold, p.model), (80, 2, ColorModel::Hsl));
        assert!(!p.is_noop());
        assert!(p.with_amount(0).is_noop());
        assert!(p.with_radius(0.0).is_noop());
        let p = p.with_model(ColorModel::Hsv).with_threshold(9);
        assert_eq!(p.mask().threshold_fixed(), 9 << 8);
    }

    #[test]
    fn test_short_buffers_rejected() {
        let mut img = [0u8; 12];
        let plane = [0u16; 4];
        assert!(apply_unsharp_value(&mut img, &plane, &plane, 2, 2, 100, 0).is_err());
        let mut img = [0u8; 16];
        assert!(apply_unsharp_value(&mut img, &plane[..3], &plane, 2, 2, 100, 0).is_err());
    }
}
