//! Errors reported by the validating front end.
//!
//! The kernels themselves never report errors. Inconsistent input to a kernel is a
//! programming error caught by debug assertions only.
use std::fmt;
use std::fmt::{Display, Formatter};

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradientError {
    /// A buffer does not have the length implied by the remaining arguments.
    BufferSize {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A size parameter is zero.
    ZeroSize { parameter: &'static str },
    /// A size parameter exceeds the maximum supported by the generic kernels.
    ExceedsMaximum {
        parameter: &'static str,
        value: usize,
        max: usize,
    },
    /// The combination of element dimension and space dimension is not supported.
    UnsupportedSpaceDim { dim: usize, sdim: usize },
}

impl Display for GradientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferSize {
                buffer,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "buffer `{buffer}` has length {actual}, but length {expected} is required"
                )
            }
            Self::ZeroSize { parameter } => write!(f, "`{parameter}` must be positive"),
            Self::ExceedsMaximum { parameter, value, max } => {
                write!(f, "`{parameter}` = {value} exceeds the supported maximum {max}")
            }
            Self::UnsupportedSpaceDim { dim, sdim } => {
                write!(
                    f,
                    "elements of dimension {dim} embedded in a space of dimension {sdim} are not supported"
                )
            }
        }
    }
}

impl std::error::Error for GradientError {}

/// Checks that the named buffer has exactly the expected length.
pub(crate) fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<(), GradientError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GradientError::BufferSize {
            buffer,
            expected,
            actual,
        })
    }
}
