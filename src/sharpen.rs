//! Complete unsharp-mask pipeline: extract, blur, composite.

use crate::blur::BlurScratch;
use crate::buffer::Geometry;
use crate::channel::extract;
use crate::error::Result;
use crate::unsharp::UnsharpParams;

/// Runs the unsharp mask over whole images, keeping its working planes
/// between calls.
#[derive(Debug, Default, Clone)]
pub struct Sharpener {
    plane: Vec<u16>,
    blurred: Vec<u16>,
    blur: BlurScratch,
}

impl Sharpener {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&mut self, g: &Geometry) {
        if self.plane.len() < g.pixels() {
            self.plane.resize(g.pixels(), 0);
            self.blurred.resize(g.pixels(), 0);
        }
    }

    /// Sharpen `img` in place. Returns the number of pixels that changed.
    pub fn sharpen(
        &mut self,
        img: &mut [u8],
        width: u32,
        height: u32,
        params: &UnsharpParams,
    ) -> Result<usize> {
        let g = Geometry::new(width, height)?;
        g.check_rgba("sharpen image", img.len())?;
        if params.is_noop() {
            log::trace!("sharpen: amount {} radius {} is a no-op", params.amount, params.radius);
            return Ok(0);
        }
        log::debug!(
            "sharpen: {width}x{height}, amount {}, radius {}, threshold {}, {}",
            params.amount,
            params.radius,
            params.threshold,
            params.model
        );

        self.reserve(&g);
        let n = g.pixels();
        let (plane, blurred) = (&mut self.plane[..n], &mut self.blurred[..n]);

        extract(params.model, img, plane, width, height)?;
        self.blur.blur(plane, blurred, width, height, params.radius)?;
        params
            .mask()
            .apply_in_place(img, plane, blurred, width, height)
    }
}

/// One-shot [`Sharpener::sharpen`].
pub fn unsharp_mask(img: &mut [u8], width: u32, height: u32, params: &UnsharpParams) -> Result<usize> {
    Sharpener::new().sharpen(img, width, height, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ColorModel;

    fn stripes(w: u32, h: u32) -> Vec<u8> {
        let mut img = Vec::new();
        for _y in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 60 } else { 190 };
                img.extend_from_slice(&[v, v / 2, v / 3, 255]);
            }
        }
        img
    }

    #[test]
    fn test_flat_image_unchanged() {
        for model in [ColorModel::Hsl, ColorModel::Hsv] {
            let img: Vec<u8> = [90u8, 140, 200, 255].repeat(64);
            let mut out = img.clone();
            let params = UnsharpParams::default()
                .with_amount(300)
                .with_radius(2.0)
                .with_model(model);
            unsharp_mask(&mut out, 8, 8, &params).unwrap();
            assert_eq!(out, img, "{model}");
        }
    }

    #[test]
    fn test_edge_gets_more_contrast() {
        for model in [ColorModel::Hsl, ColorModel::Hsv] {
            let img = stripes(12, 4);
            let mut out = img.clone();
            let params = UnsharpParams::default()
                .with_amount(200)
                .with_radius(1.5)
                .with_threshold(0)
                .with_model(model);
            let changed = Sharpener::new().sharpen(&mut out, 12, 4, &params).unwrap();
            assert!(changed > 0);

            // dark side of the edge darkens, bright side brightens
            let dark = 5 * 4;
            let bright = 6 * 4;
            assert!(out[dark] < img[dark], "{model}: {} !< {}", out[dark], img[dark]);
            assert!(out[bright] > img[bright], "{model}: {} !> {}", out[bright], img[bright]);
            assert!(out.chunks_exact(4).all(|p| p[3] == 255));
        }
    }

    #[test]
    fn test_noop_params() {
        let img = stripes(6, 2);
        let mut out = img.clone();
        let mut s = Sharpener::new();
        let zero_amount = UnsharpParams::default().with_amount(0);
        assert_eq!(s.sharpen(&mut out, 6, 2, &zero_amount).unwrap(), 0);
        let zero_radius = UnsharpParams::default().with_radius(0.0);
        assert_eq!(s.sharpen(&mut out, 6, 2, &zero_radius).unwrap(), 0);
        assert_eq!(out, img);
    }

    #[test]
    fn test_reuse_across_sizes() {
        let mut s = Sharpener::new();
        let params = UnsharpParams::default().with_amount(150).with_radius(1.0);
        let mut big = stripes(16, 8);
        s.sharpen(&mut big, 16, 8, &params).unwrap();

        let mut small = stripes(4, 2);
        let mut expected = small.clone();
        unsharp_mask(&mut expected, 4, 2, &params).unwrap();
        s.sharpen(&mut small, 4, 2, &params).unwrap();
        assert_eq!(small, expected);
    }

    #[test]
    fn test_short_image_rejected() {
        let mut img = vec![0u8; 10];
        assert!(unsharp_mask(&mut img, 2, 2, &UnsharpParams::default()).is_err());
    }
}
