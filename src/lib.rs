//! # sharpscale
//!
//! Fixed-point image resampling and unsharp masking for RGBA8 buffers.
//!
//! Every operation works on caller-owned, tightly packed buffers and is
//! bit-exact: the same input always produces the same bytes, on any
//! platform.
//!
//! ## Architecture
//!
//! Sharpening is a three-stage pipeline:
//!
//! 1. **Channel** extracts a 16-bit brightness plane (HSL lightness or HSV
//!    value) from the image.
//! 2. **Blur** runs a recursive Gaussian over that plane. Cost per pixel does
//!    not depend on the radius.
//! 3. **Unsharp** compares plane and blur and writes the boosted brightness
//!    back into RGB.
//!
//! Resizing is a separable two-pass convolution driven by caller-supplied
//! packed kernels, optionally in premultiplied-alpha space.
//!
//! [`arena::Arena`] exposes the same operations over byte offsets into a
//! single store, the way a WebAssembly host drives them.
//!
//! ```
//! use sharpscale::{unsharp_mask, UnsharpParams};
//!
//! let mut img = vec![128u8; 8 * 8 * 4];
//! let params = UnsharpParams::default().with_amount(120);
//! unsharp_mask(&mut img, 8, 8, &params).unwrap();
//! ```

// Foundation
pub mod basics;
pub mod buffer;
pub mod color;
pub mod error;

// Sharpening
pub mod blur;
pub mod channel;
pub mod gaussian;
pub mod sharpen;
pub mod unsharp;

// Resizing
pub mod kernel;
pub mod resample;

// Host bindings
pub mod arena;

pub use arena::Arena;
pub use blur::{blur_mono16, blur_mono16_in_place, BlurScratch};
pub use buffer::Geometry;
pub use channel::{extract, extract_lightness, extract_value, ColorModel};
pub use color::{Hsl16, Rgba8};
pub use error::{Error, Result};
pub use gaussian::GaussianCoefficients;
pub use kernel::{FilterKernel, KernelBuilder};
pub use resample::{intermediate_len, resample, ResampleScratch};
pub use sharpen::{unsharp_mask, Sharpener};
pub use unsharp::{
    apply_unsharp_lightness, apply_unsharp_value, unsharp_in_place, unsharp_into, UnsharpMask,
    UnsharpParams,
};
