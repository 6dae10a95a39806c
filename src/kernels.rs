//! Sum-factorized derivative kernels for tensor-product elements.
//!
//! The kernels perform no validation. All sizes must be consistent, `d1d`/`q1d` must not exceed
//! the maxima below when the runtime-sized path is used, and Jacobians must be (left-)invertible
//! at every quadrature point if physical derivatives are requested. Consistency is checked
//! with debug assertions only; see
//! [`QuadratureInterpolator`](crate::interpolator::QuadratureInterpolator) for a checked
//! front end.
//!
//! # Buffer conventions
//!
//! All buffers are column-major, i.e. the first index varies fastest:
//!
//! | Buffer    | 1D               | 2D                          | 3D                                 |
//! |-----------|------------------|-----------------------------|------------------------------------|
//! | DOFs      | `(d, c, e)`      | `(dx, dy, c, e)`            | `(dx, dy, dz, c, e)`               |
//! | Jacobians | `(q, row, e)`    | `(qx, qy, row, col, e)`     | `(qx, qy, qz, row, col, e)`        |
//!
//! Jacobians have `sdim` rows and `dim` columns. The output layout is selected by
//! [`OutputLayout`](crate::layout::OutputLayout), with linear quadrature index
//! `qx + q1d * qy + q1d^2 * qz`. Physical derivatives have `sdim` directions, reference
//! derivatives have `dim` directions.
use crate::basis::BasisView;
use crate::Real;
use davenport::{define_thread_local_workspace, with_thread_local_workspace};

mod derivatives_1d;
mod derivatives_2d;
mod derivatives_3d;
mod table;

pub use derivatives_1d::derivatives_1d;
pub use derivatives_2d::derivatives_2d;
pub use derivatives_3d::derivatives_3d;
pub use table::*;

/// Maximum number of 1D DOFs supported by the runtime-sized 2D kernel.
pub const MAX_D1D: usize = 14;
/// Maximum number of 1D quadrature points supported by the runtime-sized 2D kernel.
pub const MAX_Q1D: usize = 14;
/// Maximum number of 1D DOFs supported by the runtime-sized 3D kernel.
pub const MAX_D1D_3D: usize = 8;
/// Maximum number of 1D quadrature points supported by the runtime-sized 3D kernel.
pub const MAX_Q1D_3D: usize = 8;

/// Input shared by all derivative kernels.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeInput<'a, T> {
    pub num_elements: usize,
    pub basis: BasisView<'a, T>,
    /// Per-point Jacobians. Only read when physical derivatives are requested.
    pub jacobians: &'a [T],
    /// Element DOF values.
    pub dofs: &'a [T],
    /// Number of field components.
    pub vdim: usize,
    /// Dimension of the physical space. Only relevant for physical derivatives.
    pub sdim: usize,
}

impl<'a, T> DerivativeInput<'a, T> {
    /// Number of derivative directions in the output.
    pub fn num_directions(&self, dim: usize, physical: bool) -> usize {
        if physical {
            self.sdim
        } else {
            dim
        }
    }
}

/// Scratch buffers of the 2D kernel, sized exactly for the current `d1d`, `q1d`.
#[derive(Debug)]
pub struct Scratch2d<'s, T> {
    pub(crate) x: &'s mut [T],
    pub(crate) dq0: &'s mut [T],
    pub(crate) dq1: &'s mut [T],
}

/// Scratch buffers of the 3D kernel, sized exactly for the current `d1d`, `q1d`.
#[derive(Debug)]
pub struct Scratch3d<'s, T> {
    pub(crate) x: &'s mut [T],
    pub(crate) ddq0: &'s mut [T],
    pub(crate) ddq1: &'s mut [T],
    pub(crate) dqq0: &'s mut [T],
    pub(crate) dqq1: &'s mut [T],
    pub(crate) dqq2: &'s mut [T],
}

/// Kernel sizes, either fixed at compile time or given at runtime.
///
/// The sizes also determine where the kernel scratch lives: fixed sizes use stack arrays,
/// runtime sizes use a thread-local buffer bounded by the configured maxima.
pub trait KernelDims: Copy + Send + Sync {
    fn vdim(&self) -> usize;
    fn d1d(&self) -> usize;
    fn q1d(&self) -> usize;

    fn with_scratch_2d<T: Real, R>(&self, f: impl FnOnce(Scratch2d<'_, T>) -> R) -> R;
    fn with_scratch_3d<T: Real, R>(&self, f: impl FnOnce(Scratch3d<'_, T>) -> R) -> R;
}

/// Sizes given at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeDims {
    pub vdim: usize,
    pub d1d: usize,
    pub q1d: usize,
}

impl RuntimeDims {
    pub fn from_input<T>(input: &DerivativeInput<T>) -> Self {
        Self {
            vdim: input.vdim,
            d1d: input.basis.d1d,
            q1d: input.basis.q1d,
        }
    }
}

/// Sizes fixed at compile time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedDims<const VDIM: usize, const D1D: usize, const Q1D: usize>;

define_thread_local_workspace!(SCRATCH);

/// Backing storage of runtime-sized scratch, allocated once per thread and scalar type.
#[derive(Debug)]
struct ScratchBuffers<T> {
    data: Vec<T>,
}

impl<T> Default for ScratchBuffers<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T: Real> ScratchBuffers<T> {
    fn reserve(&mut self, len: usize) -> &mut [T] {
        if self.data.len() < len {
            self.data.resize(len, T::zero());
        }
        &mut self.data
    }
}

fn split_off<'s, T>(data: &mut &'s mut [T], len: usize) -> &'s mut [T] {
    let (head, tail) = std::mem::take(data).split_at_mut(len);
    *data = tail;
    head
}

impl KernelDims for RuntimeDims {
    fn vdim(&self) -> usize {
        self.vdim
    }

    fn d1d(&self) -> usize {
        self.d1d
    }

    fn q1d(&self) -> usize {
        self.q1d
    }

    fn with_scratch_2d<T: Real, R>(&self, f: impl FnOnce(Scratch2d<'_, T>) -> R) -> R {
        let (d, q) = (self.d1d, self.q1d);
        debug_assert!(d <= MAX_D1D && q <= MAX_Q1D, "d1d = {d}, q1d = {q} exceed the 2D maxima");
        with_thread_local_workspace(&SCRATCH, |ws: &mut ScratchBuffers<T>| {
            let mut data = ws.reserve(MAX_D1D * MAX_D1D + 2 * MAX_D1D * MAX_Q1D);
            f(Scratch2d {
                x: split_off(&mut data, d * d),
                dq0: split_off(&mut data, d * q),
                dq1: split_off(&mut data, d * q),
            })
        })
    }

    fn with_scratch_3d<T: Real, R>(&self, f: impl FnOnce(Scratch3d<'_, T>) -> R) -> R {
        let (d, q) = (self.d1d, self.q1d);
        debug_assert!(d <= MAX_D1D_3D && q <= MAX_Q1D_3D, "d1d = {d}, q1d = {q} exceed the 3D maxima");
        let (md, mq) = (MAX_D1D_3D, MAX_Q1D_3D);
        with_thread_local_workspace(&SCRATCH, |ws: &mut ScratchBuffers<T>| {
            let mut data = ws.reserve(md * md * md + 2 * md * md * mq + 3 * md * mq * mq);
            f(Scratch3d {
                x: split_off(&mut data, d * d * d),
                ddq0: split_off(&mut data, d * d * q),
                ddq1: split_off(&mut data, d * d * q),
                dqq0: split_off(&mut data, d * q * q),
                dqq1: split_off(&mut data, d * q * q),
                dqq2: split_off(&mut data, d * q * q),
            })
        })
    }
}

impl<const VDIM: usize, const D1D: usize, const Q1D: usize> KernelDims for FixedDims<VDIM, D1D, Q1D> {
    #[inline(always)]
    fn vdim(&self) -> usize {
        VDIM
    }

    #[inline(always)]
    fn d1d(&self) -> usize {
        D1D
    }

    #[inline(always)]
    fn q1d(&self) -> usize {
        Q1D
    }

    #[inline(always)]
    fn with_scratch_2d<T: Real, R>(&self, f: impl FnOnce(Scratch2d<'_, T>) -> R) -> R {
        let mut x = [[T::zero(); D1D]; D1D];
        let mut dq0 = [[T::zero(); Q1D]; D1D];
        let mut dq1 = [[T::zero(); Q1D]; D1D];
        f(Scratch2d {
            x: x.as_flattened_mut(),
            dq0: dq0.as_flattened_mut(),
            dq1: dq1.as_flattened_mut(),
        })
    }

    #[inline(always)]
    fn with_scratch_3d<T: Real, R>(&self, f: impl FnOnce(Scratch3d<'_, T>) -> R) -> R {
        let mut x = [[[T::zero(); D1D]; D1D]; D1D];
        let mut ddq0 = [[[T::zero(); Q1D]; D1D]; D1D];
        let mut ddq1 = [[[T::zero(); Q1D]; D1D]; D1D];
        let mut dqq0 = [[[T::zero(); Q1D]; Q1D]; D1D];
        let mut dqq1 = [[[T::zero(); Q1D]; Q1D]; D1D];
        let mut dqq2 = [[[T::zero(); Q1D]; Q1D]; D1D];
        f(Scratch3d {
            x: x.as_flattened_mut().as_flattened_mut(),
            ddq0: ddq0.as_flattened_mut().as_flattened_mut(),
            ddq1: ddq1.as_flattened_mut().as_flattened_mut(),
            dqq0: dqq0.as_flattened_mut().as_flattened_mut(),
            dqq1: dqq1.as_flattened_mut().as_flattened_mut(),
            dqq2: dqq2.as_flattened_mut().as_flattened_mut(),
        })
    }
}
