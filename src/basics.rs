//! Fixed-point constants and saturation helpers.
//!
//! The unsharp math works in Q12 (`x * 4096`), the resampler in Q14 with a
//! Q7 intermediate. Every shift truncates unless a rounding constant is
//! added first.

// ============================================================================
// Q12 (unsharp) constants
// ============================================================================

pub const Q12_SHIFT: u32 = 12;
pub const Q12_ONE: i32 = 1 << Q12_SHIFT; // 4096
/// Half a Q12 unit, added before `>> 12` to round.
pub const Q12_HALF: i32 = Q12_ONE >> 1; // 0x800

/// Largest 16-bit lightness.
pub const LIGHTNESS_MAX: i32 = 0xffff;
/// Largest 16-bit value (`255 << 8`). Values never enter `0xff01..=0xffff`.
pub const VALUE_MAX: i32 = 0xff00;

// ============================================================================
// Saturation
// ============================================================================

/// Clamp to `[0, 255]`.
#[inline]
pub fn clamp_to_8(v: i32) -> u8 {
    if v < 0 {
        0
    } else if v > 255 {
        255
    } else {
        v as u8
    }
}

/// Clamp negative values to zero.
#[inline]
pub fn clamp_negative(v: i32) -> u32 {
    if v >= 0 {
        v as u32
    } else {
        0
    }
}

/// Convert an amount in percent to a Q12 multiplier.
///
/// The scaling runs in `f32` and the half-unit rounding in `f64`, which is
/// the exact sequence reference output was produced with; a pure-`f64`
/// version differs for some amounts.
#[inline]
pub fn amount_to_q12(amount_percent: u32) -> i32 {
    let scaled = amount_percent as f32 * Q12_ONE as f32 / 100.0;
    (scaled as f64 + 0.5) as i32
}

/// `(amount_fp * diff + 0x800) >> 12`, computed in `i64` and saturated to
/// the `i32` range.
#[inline]
pub fn q12_scale(amount_fp: i32, diff: i32) -> i32 {
    let scaled = (amount_fp as i64 * diff as i64 + Q12_HALF as i64) >> Q12_SHIFT;
    scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
