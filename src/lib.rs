//! Evaluation of derivatives of finite element fields at quadrature points.
//!
//! The kernels in this crate operate on batches of tensor-product elements (segments,
//! quadrilaterals and hexahedra). Given tabulated 1D basis values and derivatives, they compute
//! reference-space gradients by sum factorization, and optionally map them to physical space
//! using per-point Jacobians.
//!
//! The [`kernels`] module exposes the raw, unchecked kernels, while
//! [`QuadratureInterpolator`](interpolator::QuadratureInterpolator) provides a validating
//! front end.
use nalgebra::RealField;

pub mod basis;
pub mod dispatch;
pub mod error;
pub mod interpolator;
pub mod jacobian;
pub mod kernels;
pub mod layout;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;

/// Scalar type used by all kernels.
///
/// Used as a trait alias for the traits needed by the kernels.
pub trait Real: RealField + Copy + Send + Sync {}

impl<T: RealField + Copy + Send + Sync> Real for T {}
