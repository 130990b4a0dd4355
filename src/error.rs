//! Error type shared by every public entry point.
//!
//! All checks run before the first write, so a call that returns an error
//! has left its output buffers untouched.

use core::fmt;

/// Precondition violations detected at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Width or height is zero, or `width * height` overflows.
    InvalidGeometry { width: u32, height: u32 },
    /// A buffer is shorter than the stated geometry requires.
    BufferTooSmall {
        what: &'static str,
        required: usize,
        actual: usize,
    },
    /// A filter kernel record is malformed or reads outside the source line.
    InvalidKernel { index: usize, reason: &'static str },
    /// An arena offset is not aligned to its element type.
    Misaligned { offset: usize, align: usize },
    /// Two arena regions that are written during one call overlap.
    Overlap,
    /// A color model name that is neither HSL nor HSV.
    UnknownColorModel { name: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry { width, height } => {
                write!(f, "invalid geometry {width}x{height}")
            }
            Self::BufferTooSmall {
                what,
                required,
                actual,
            } => {
                write!(f, "{what}: expected at least {required} elements, got {actual}")
            }
            Self::InvalidKernel { index, reason } => {
                write!(f, "filter kernel record {index}: {reason}")
            }
            Self::Misaligned { offset, align } => {
                write!(f, "arena offset {offset} is not {align}-byte aligned")
            }
            Self::Overlap => write!(f, "arena regions overlap"),
            Self::UnknownColorModel { name } => write!(f, "unknown color model '{name}'"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
