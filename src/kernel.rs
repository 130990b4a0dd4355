//! Packed resampling kernels.
//!
//! A kernel is a flat `i16` sequence with one record per destination index:
//!
//! ```text
//! [shift, count, w0, w1, ..., w(count-1)]
//! ```
//!
//! `shift` is the first source index the record reads, the weights are
//! Q14 fixed point and normally sum to [`FILTER_SCALE`]. Building kernels
//! (choosing a window function and scale) is up to the caller;
//! [`KernelBuilder`] only packs records.

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

pub const FILTER_SHIFT: u32 = 14;
pub const FILTER_SCALE: i32 = 1 << FILTER_SHIFT; // 16384

/// Precision dropped after the first pass; the 16-bit intermediate keeps the rest.
pub const INTERMEDIATE_SHIFT: u32 = 7;

/// Shift that brings a second-pass sum back to 8 bits.
pub const FINAL_SHIFT: u32 = FILTER_SHIFT;

/// Rounding constant for [`FINAL_SHIFT`].
pub const FINAL_ROUND: i32 = 1 << (FINAL_SHIFT - 1);

/// Largest `Σ|w|` a record may have. Keeps `Σ w·a·c` over 8-bit taps and
/// `Σ w·t` over the 16-bit intermediate inside `i32`, and every first-pass
/// result inside `u16`.
pub const MAX_ABS_WEIGHT_SUM: i32 = i16::MAX as i32;

// ============================================================================
// FilterKernel
// ============================================================================

/// One destination index: where to start reading and with which weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelRecord<'a> {
    pub shift: usize,
    pub weights: &'a [i16],
}

/// A packed kernel checked against a source and destination length.
///
/// Construction walks every record once, so the convolution loops can index
/// without further checks failing.
#[derive(Debug, Clone, Copy)]
pub struct FilterKernel<'a> {
    data: &'a [i16],
    dst_len: usize,
}

impl<'a> FilterKernel<'a> {
    /// Validate `data` as `dst_len` records reading from lines of `src_len`.
    pub fn new(data: &'a [i16], src_len: usize, dst_len: usize) -> Result<Self> {
        let mut pos = 0;
        for index in 0..dst_len {
            if pos + 2 > data.len() {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "record header past end of kernel",
                });
            }
            let shift = data[pos];
            let count = data[pos + 1];
            if shift < 0 {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "negative source shift",
                });
            }
            if count < 0 {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "negative tap count",
                });
            }
            if shift as usize + count as usize > src_len {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "taps read past the source line",
                });
            }
            let start = pos + 2;
            pos = start + count as usize;
            if pos > data.len() {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "weights past end of kernel",
                });
            }
            let magnitude: i32 = data[start..pos].iter().map(|&w| (w as i32).abs()).sum();
            if magnitude > MAX_ABS_WEIGHT_SUM {
                return Err(Error::InvalidKernel {
                    index,
                    reason: "weights overflow the accumulator",
                });
            }
        }
        Ok(Self {
            data: &data[..pos],
            dst_len,
        })
    }

    /// Number of destination records.
    pub fn len(&self) -> usize {
        self.dst_len
    }

    pub fn is_empty(&self) -> bool {
        self.dst_len == 0
    }

    /// The validated prefix of the packed data.
    pub fn as_slice(&self) -> &'a [i16] {
        self.data
    }

    pub fn records(&self) -> Records<'a> {
        Records {
            data: self.data,
            pos: 0,
        }
    }
}

/// Iterator over the records of a [`FilterKernel`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    data: &'a [i16],
    pos: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = KernelRecord<'a>;

    #[inline]
    fn next(&mut self) -> Option<KernelRecord<'a>> {
        if self.pos >= self.data.len() {
            return None;
        }
        let shift = self.data[self.pos] as usize;
        let count = self.data[self.pos + 1] as usize;
        let start = self.pos + 2;
        self.pos = start + count;
        Some(KernelRecord {
            shift,
            weights: &self.data[start..start + count],
        })
    }
}

// ============================================================================
// KernelBuilder
// ============================================================================

/// Packs records into the flat kernel layout.
#[derive(Debug, Default, Clone)]
pub struct KernelBuilder {
    data: Vec<i16>,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shift: i16, weights: &[i16]) -> &mut Self {
        self.data.push(shift);
        self.data.push(weights.len() as i16);
        self.data.extend_from_slice(weights);
        self
    }

    pub fn build(self) -> Vec<i16> {
        self.data
    }

    /// One unit tap per index: destination `i` copies source `i`.
    pub fn identity(len: usize) -> Vec<i16> {
        let mut b = Self::new();
        for i in 0..len {
            b.push(i as i16, &[FILTER_SCALE as i16]);
        }
        b.build()
    }
}
