//! Separable convolution resize of RGBA images.
//!
//! The horizontal pass filters each source row with the horizontal kernel
//! and stores the result transposed, as 16-bit samples with 7 extra bits of
//! precision. The vertical pass then filters the rows of that transposed
//! intermediate exactly like the first pass filtered source rows, and
//! writes the final 8-bit pixels back in normal orientation.
//!
//! With `has_alpha`, color taps are weighted by their pixel's alpha so that
//! transparent neighbors do not bleed color into the result, and the
//! vertical pass divides the alpha back out.

use crate::basics::{clamp_negative, clamp_to_8};
use crate::buffer::{require, Geometry, RGBA_BYTES};
use crate::error::Result;
use crate::kernel::{FilterKernel, FINAL_ROUND, FINAL_SHIFT, INTERMEDIATE_SHIFT};

// ============================================================================
// Horizontal passes: RGBA8 rows -> transposed u16 intermediate
// ============================================================================

fn convolve_horizontal(
    src: &[u8],
    tmp: &mut [u16],
    src_w: usize,
    src_h: usize,
    kernel: &FilterKernel,
) {
    for (y, row) in src.chunks_exact(src_w * 4).take(src_h).enumerate() {
        for (dx, rec) in kernel.records().enumerate() {
            let taps = &row[rec.shift * 4..(rec.shift + rec.weights.len()) * 4];
            let (mut r, mut g, mut b, mut a) = (0i32, 0i32, 0i32, 0i32);
            for (&w, px) in rec.weights.iter().zip(taps.chunks_exact(4)) {
                let w = w as i32;
                r += w * px[0] as i32;
                g += w * px[1] as i32;
                b += w * px[2] as i32;
                a += w * px[3] as i32;
            }

            let out = &mut tmp[(dx * src_h + y) * 4..][..4];
            out[0] = clamp_negative(r >> INTERMEDIATE_SHIFT) as u16;
            out[1] = clamp_negative(g >> INTERMEDIATE_SHIFT) as u16;
            out[2] = clamp_negative(b >> INTERMEDIATE_SHIFT) as u16;
            out[3] = clamp_negative(a >> INTERMEDIATE_SHIFT) as u16;
        }
    }
}

fn convolve_horizontal_premultiplied(
    src: &[u8],
    tmp: &mut [u16],
    src_w: usize,
    src_h: usize,
    kernel: &FilterKernel,
) {
    for (y, row) in src.chunks_exact(src_w * 4).take(src_h).enumerate() {
        for (dx, rec) in kernel.records().enumerate() {
            let taps = &row[rec.shift * 4..(rec.shift + rec.weights.len()) * 4];
            let (mut r, mut g, mut b, mut a) = (0i32, 0i32, 0i32, 0i32);
            for (&w, px) in rec.weights.iter().zip(taps.chunks_exact(4)) {
                let w = w as i32;
                let alpha = px[3] as i32;
                r += w * alpha * px[0] as i32;
                g += w * alpha * px[1] as i32;
                b += w * alpha * px[2] as i32;
                a += w * alpha;
            }

            // Premultiplying is `* alpha / 255`; the division is done once
            // per sum instead of once per tap.
            r /= 255;
            g /= 255;
            b /= 255;

            let out = &mut tmp[(dx * src_h + y) * 4..][..4];
            out[0] = clamp_negative(r >> INTERMEDIATE_SHIFT) as u16;
            out[1] = clamp_negative(g >> INTERMEDIATE_SHIFT) as u16;
            out[2] = clamp_negative(b >> INTERMEDIATE_SHIFT) as u16;
            out[3] = clamp_negative(a >> INTERMEDIATE_SHIFT) as u16;
        }
    }
}

// ============================================================================
// Vertical passes: transposed u16 intermediate -> RGBA8 rows
// ============================================================================

/// `tmp` has `dst_w` rows of `src_h` pixels.
#[inline]
fn accumulate_column(col: &[u16], weights: &[i16]) -> [i32; 4] {
    let mut acc = [0i32; 4];
    for (&w, px) in weights.iter().zip(col.chunks_exact(4)) {
        let w = w as i32;
        acc[0] += w * px[0] as i32;
        acc[1] += w * px[1] as i32;
        acc[2] += w * px[2] as i32;
        acc[3] += w * px[3] as i32;
    }
    acc
}

fn convolve_vertical(
    tmp: &[u16],
    dst: &mut [u8],
    src_h: usize,
    dst_w: usize,
    kernel: &FilterKernel,
) {
    for (x, row) in tmp.chunks_exact(src_h * 4).take(dst_w).enumerate() {
        for (dy, rec) in kernel.records().enumerate() {
            let col = &row[rec.shift * 4..(rec.shift + rec.weights.len()) * 4];
            // Shift first so the result matches the premultiplied path bit for bit.
            let [r, g, b, a] = accumulate_column(col, rec.weights).map(|v| v >> INTERMEDIATE_SHIFT);

            let out = &mut dst[(dy * dst_w + x) * 4..][..4];
            out[0] = clamp_to_8((r + FINAL_ROUND) >> FINAL_SHIFT);
            out[1] = clamp_to_8((g + FINAL_ROUND) >> FINAL_SHIFT);
            out[2] = clamp_to_8((b + FINAL_ROUND) >> FINAL_SHIFT);
            out[3] = clamp_to_8((a + FINAL_ROUND) >> FINAL_SHIFT);
        }
    }
}

/// `c * 255 / a`, widened, and kept low enough that adding
/// [`FINAL_ROUND`] cannot overflow.
#[inline]
fn unpremultiply(c: i32, a: i32) -> i32 {
    (c as i64 * 255 / a as i64).clamp(i32::MIN as i64, (i32::MAX - FINAL_ROUND) as i64) as i32
}

fn convolve_vertical_premultiplied(
    tmp: &[u16],
    dst: &mut [u8],
    src_h: usize,
    dst_w: usize,
    kernel: &FilterKernel,
) {
    for (x, row) in tmp.chunks_exact(src_h * 4).take(dst_w).enumerate() {
        for (dy, rec) in kernel.records().enumerate() {
            let col = &row[rec.shift * 4..(rec.shift + rec.weights.len()) * 4];
            // Downscale first to leave room for the un-premultiply.
            let [mut r, mut g, mut b, a] =
                accumulate_column(col, rec.weights).map(|v| v >> INTERMEDIATE_SHIFT);

            let a = clamp_to_8((a + FINAL_ROUND) >> FINAL_SHIFT);
            if a > 0 {
                let a = a as i32;
                r = unpremultiply(r, a);
                g = unpremultiply(g, a);
                b = unpremultiply(b, a);
            }

            let out = &mut dst[(dy * dst_w + x) * 4..][..4];
            out[0] = clamp_to_8((r + FINAL_ROUND) >> FINAL_SHIFT);
            out[1] = clamp_to_8((g + FINAL_ROUND) >> FINAL_SHIFT);
            out[2] = clamp_to_8((b + FINAL_ROUND) >> FINAL_SHIFT);
            out[3] = a;
        }
    }
}

/// First pass. Buffers and kernel must already be validated.
pub(crate) fn horizontal_pass(
    src: &[u8],
    tmp: &mut [u16],
    src_w: usize,
    src_h: usize,
    kernel: &FilterKernel,
    has_alpha: bool,
) {
    log::trace!("resample: horizontal pass over {src_h} rows");
    if has_alpha {
        convolve_horizontal_premultiplied(src, tmp, src_w, src_h, kernel);
    } else {
        convolve_horizontal(src, tmp, src_w, src_h, kernel);
    }
}

/// Second pass. Buffers and kernel must already be validated.
pub(crate) fn vertical_pass(
    tmp: &[u16],
    dst: &mut [u8],
    src_h: usize,
    dst_w: usize,
    kernel: &FilterKernel,
    has_alpha: bool,
) {
    log::trace!("resample: vertical pass over {dst_w} columns");
    if has_alpha {
        convolve_vertical_premultiplied(tmp, dst, src_h, dst_w, kernel);
    } else {
        convolve_vertical(tmp, dst, src_h, dst_w, kernel);
    }
}

// ============================================================================
// Public entry points
// ============================================================================

/// Samples (`u16`) the intermediate buffer needs for a resize.
pub fn intermediate_len(src_h: u32, dst_w: u32) -> usize {
    src_h as usize * dst_w as usize * RGBA_BYTES
}

/// Resize `src` (`src_w x src_h`) into `dst` (`dst_w x dst_h`).
///
/// `h_kernel` holds `dst_w` records over source rows, `v_kernel` holds
/// `dst_h` records over source columns. `tmp` must hold at least
/// [`intermediate_len`] samples. With `has_alpha` the filtering is done in
/// premultiplied space.
#[allow(clippy::too_many_arguments)]
pub fn resample(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u16],
    h_kernel: &[i16],
    v_kernel: &[i16],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    has_alpha: bool,
) -> Result<()> {
    let src_g = Geometry::new(src_w, src_h)?;
    let dst_g = Geometry::new(dst_w, dst_h)?;
    src_g.check_rgba("resample source image", src.len())?;
    dst_g.check_rgba("resample destination image", dst.len())?;
    require(
        "resample intermediate buffer",
        intermediate_len(src_h, dst_w),
        tmp.len(),
    )?;
    let hk = FilterKernel::new(h_kernel, src_g.width(), dst_g.width())?;
    let vk = FilterKernel::new(v_kernel, src_g.height(), dst_g.height())?;

    log::debug!("resample: {src_w}x{src_h} -> {dst_w}x{dst_h}, alpha {has_alpha}");

    let (sw, sh, dw) = (src_g.width(), src_g.height(), dst_g.width());
    horizontal_pass(src, tmp, sw, sh, &hk, has_alpha);
    vertical_pass(tmp, dst, sh, dw, &vk, has_alpha);
    Ok(())
}

/// Owned intermediate buffer for repeated [`resample`] calls.
#[derive(Debug, Default, Clone)]
pub struct ResampleScratch {
    tmp: Vec<u16>,
}

impl ResampleScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize, growing the intermediate first if needed.
    #[allow(clippy::too_many_arguments)]
    pub fn resample(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        h_kernel: &[i16],
        v_kernel: &[i16],
        src_w: u32,
        src_h: u32,
        dst_w: u32,
        dst_h: u32,
        has_alpha: bool,
    ) -> Result<()> {
        let need = intermediate_len(src_h, dst_w);
        if self.tmp.len() < need {
            self.tmp.resize(need, 0);
        }
        resample(
            src,
            dst,
            &mut self.tmp,
            h_kernel,
            v_kernel,
            src_w,
            src_h,
            dst_w,
            dst_h,
            has_alpha,
        )
    }
}
