//! Recursive (IIR) Gaussian blur of a 16-bit plane.
//!
//! Each line is filtered twice, left to right and right to left, and the
//! two responses are summed. The result is written transposed, so running
//! the same line filter over the transposed plane performs the vertical
//! pass and transposes back.
//!
//! Work per pixel is constant regardless of radius.

use crate::buffer::{require, Geometry};
use crate::error::Result;
use crate::gaussian::GaussianCoefficients;

// ============================================================================
// Line filter
// ============================================================================

/// Filter one line of `width` samples and write it as column `col` of the
/// transposed `out` (which has `height` samples per row).
///
/// `line` receives the causal response as `f32`; the anti-causal response is
/// added to it on the way back. The order of both loops is fixed: changing it
/// changes the low bits of the output.
fn gauss16_line(
    src: &[u16],
    out: &mut [u16],
    col: usize,
    line: &mut [f32],
    c: &GaussianCoefficients,
    height: usize,
) {
    let width = src.len();
    let a0 = c.a0 as f64;
    let a1 = c.a1 as f64;
    let a2 = c.a2 as f64;
    let a3 = c.a3 as f64;
    let b1 = c.b1 as f64;
    let b2 = c.b2 as f64;

    // Left to right
    let mut prev_src = src[0] as f64;
    let mut prev_prev_out = prev_src * c.left_corner as f64;
    let mut prev_out = prev_prev_out;

    for (&s, slot) in src.iter().zip(line.iter_mut()) {
        let curr_src = s as f64;
        let curr_out = curr_src * a0 + prev_src * a1 + prev_out * b1 + prev_prev_out * b2;

        prev_prev_out = prev_out;
        prev_out = curr_out;
        prev_src = curr_src;

        *slot = curr_out as f32;
    }

    // Right to left. The input runs one sample ahead of the output, so the
    // last sample is consumed twice before the walk starts moving.
    let mut prev_src = src[width - 1] as f64;
    let mut prev_prev_out = prev_src * c.right_corner as f64;
    let mut prev_out = prev_prev_out;
    let mut curr_src = prev_src;

    for x in (0..width).rev() {
        let curr_out = curr_src * a2 + prev_src * a3 + prev_out * b1 + prev_prev_out * b2;

        prev_prev_out = prev_out;
        prev_out = curr_out;

        prev_src = curr_src;
        curr_src = src[x] as f64;

        out[x * height + col] = (line[x] as f64 + prev_out) as u16;
    }
}

/// Filter every row of `src` into `out`, transposing.
pub(crate) fn blur_rows(
    src: &[u16],
    out: &mut [u16],
    line: &mut [f32],
    c: &GaussianCoefficients,
    width: usize,
    height: usize,
) {
    for (row, src_row) in src.chunks_exact(width).take(height).enumerate() {
        gauss16_line(src_row, out, row, line, c, height);
    }
}

// ============================================================================
// Public entry points
// ============================================================================

fn check_buffers(
    g: &Geometry,
    src: usize,
    dst: usize,
    scratch_plane: usize,
    scratch_line: usize,
) -> Result<()> {
    g.check_plane("blur source plane", src)?;
    g.check_plane("blur destination plane", dst)?;
    g.check_plane("blur scratch plane", scratch_plane)?;
    require(
        "blur scratch line",
        g.width().max(g.height()),
        scratch_line,
    )
}

/// Blur a 16-bit plane with a recursive Gaussian of `radius`.
///
/// `scratch_plane` must hold `width * height` samples and `scratch_line`
/// `max(width, height)` floats. A radius of zero or less leaves `dst`
/// untouched and returns `Ok(None)`; radii below 0.5 are raised to 0.5.
/// On success the coefficients that were used are returned.
pub fn blur_mono16(
    src: &[u16],
    dst: &mut [u16],
    scratch_plane: &mut [u16],
    scratch_line: &mut [f32],
    width: u32,
    height: u32,
    radius: f32,
) -> Result<Option<GaussianCoefficients>> {
    let g = Geometry::new(width, height)?;
    check_buffers(&g, src.len(), dst.len(), scratch_plane.len(), scratch_line.len())?;
    log::debug!("blur_mono16: {width}x{height}, radius {radius}");

    let Some(c) = GaussianCoefficients::for_blur(radius) else {
        log::trace!("blur_mono16: radius {radius} is a no-op");
        return Ok(None);
    };

    let (w, h) = (g.width(), g.height());
    blur_rows(src, scratch_plane, scratch_line, &c, w, h);
    blur_rows(scratch_plane, dst, scratch_line, &c, h, w);
    Ok(Some(c))
}

/// [`blur_mono16`] with the source and destination being the same plane.
pub fn blur_mono16_in_place(
    plane: &mut [u16],
    scratch_plane: &mut [u16],
    scratch_line: &mut [f32],
    width: u32,
    height: u32,
    radius: f32,
) -> Result<Option<GaussianCoefficients>> {
    let g = Geometry::new(width, height)?;
    check_buffers(&g, plane.len(), plane.len(), scratch_plane.len(), scratch_line.len())?;
    log::debug!("blur_mono16_in_place: {width}x{height}, radius {radius}");

    let Some(c) = GaussianCoefficients::for_blur(radius) else {
        return Ok(None);
    };

    let (w, h) = (g.width(), g.height());
    blur_rows(plane, scratch_plane, scratch_line, &c, w, h);
    blur_rows(scratch_plane, plane, scratch_line, &c, h, w);
    Ok(Some(c))
}

// ============================================================================
// Owned scratch
// ============================================================================

/// Reusable scratch storage for [`blur_mono16`].
///
/// Grows on demand and never shrinks, so one instance can serve a stream of
/// differently sized planes.
#[derive(Debug, Default, Clone)]
pub struct BlurScratch {
    plane: Vec<u16>,
    line: Vec<f32>,
}

impl BlurScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: u32, height: u32) -> Result<Self> {
        let mut s = Self::new();
        s.reserve(&Geometry::new(width, height)?);
        Ok(s)
    }

    fn reserve(&mut self, g: &Geometry) {
        if self.plane.len() < g.pixels() {
            self.plane.resize(g.pixels(), 0);
        }
        let line = g.width().max(g.height());
        if self.line.len() < line {
            self.line.resize(line, 0.0);
        }
    }

    /// Blur `src` into `dst`, growing the scratch first if needed.
    pub fn blur(
        &mut self,
        src: &[u16],
        dst: &mut [u16],
        width: u32,
        height: u32,
        radius: f32,
    ) -> Result<Option<GaussianCoefficients>> {
        self.reserve(&Geometry::new(width, height)?);
        blur_mono16(src, dst, &mut self.plane, &mut self.line, width, height, radius)
    }

    /// Blur `plane` in place, growing the scratch first if needed.
    pub fn blur_in_place(
        &mut self,
        plane: &mut [u16],
        width: u32,
        height: u32,
        radius: f32,
    ) -> Result<Option<GaussianCoefficients>> {
        self.reserve(&Geometry::new(width, height)?);
        blur_mono16_in_place(plane, &mut self.plane, &mut self.line, width, height, radius)
    }
}
