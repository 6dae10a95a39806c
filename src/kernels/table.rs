//! Selection between fixed-size and runtime-sized kernels.
//!
//! Commonly used combinations of `(vdim, d1d, q1d)` have dedicated instantiations with
//! compile-time sizes, which lets the compiler fully unroll the contractions and keep the
//! scratch buffers on the stack. Other combinations fall back to the runtime-sized kernels.
use crate::dispatch::ElementExecutor;
use crate::kernels::{derivatives_2d, derivatives_3d, DerivativeInput, FixedDims, RuntimeDims};
use crate::layout::{DerivativeMode, OutputLayout};
use crate::Real;
use log::{debug, trace};

/// A derivative kernel with all size and layout choices resolved.
///
/// Arguments are the executor, the input, the number of elements per batch and the output.
pub type DerivativeKernel<T, E> = fn(&E, &DerivativeInput<'_, T>, usize, &mut [T]);

fn fixed_2d<T, L, M, E, const VDIM: usize, const D1D: usize, const Q1D: usize>(
    executor: &E,
    input: &DerivativeInput<'_, T>,
    batch_size: usize,
    output: &mut [T],
) where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    derivatives_2d::<T, L, M, E, _>(executor, input, FixedDims::<VDIM, D1D, Q1D>, batch_size, output)
}

fn fixed_3d<T, L, M, E, const VDIM: usize, const D1D: usize, const Q1D: usize>(
    executor: &E,
    input: &DerivativeInput<'_, T>,
    batch_size: usize,
    output: &mut [T],
) where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    derivatives_3d::<T, L, M, E, _>(executor, input, FixedDims::<VDIM, D1D, Q1D>, batch_size, output)
}

/// Runtime-sized 2D kernel.
pub fn runtime_2d<T, L, M, E>(executor: &E, input: &DerivativeInput<'_, T>, batch_size: usize, output: &mut [T])
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    derivatives_2d::<T, L, M, E, _>(executor, input, RuntimeDims::from_input(input), batch_size, output)
}

/// Runtime-sized 3D kernel.
pub fn runtime_3d<T, L, M, E>(executor: &E, input: &DerivativeInput<'_, T>, batch_size: usize, output: &mut [T])
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    derivatives_3d::<T, L, M, E, _>(executor, input, RuntimeDims::from_input(input), batch_size, output)
}

macro_rules! fixed_kernel_table {
    ($(#[$attr:meta])* $name:ident, $kernel:ident, [$(($vdim:literal, $d1d:literal, $q1d:literal)),* $(,)?]) => {
        $(#[$attr])*
        pub fn $name<T, L, M, E>(vdim: usize, d1d: usize, q1d: usize) -> Option<DerivativeKernel<T, E>>
        where
            T: Real,
            L: OutputLayout,
            M: DerivativeMode,
            E: ElementExecutor,
        {
            match (vdim, d1d, q1d) {
                $(
                    ($vdim, $d1d, $q1d) => Some($kernel::<T, L, M, E, $vdim, $d1d, $q1d> as DerivativeKernel<T, E>),
                )*
                _ => None,
            }
        }
    };
}

fixed_kernel_table!(
    /// Looks up a fixed-size 2D kernel for the given sizes.
    fixed_derivatives_2d_kernel,
    fixed_2d,
    [
        (1, 2, 2), (1, 2, 3), (1, 2, 4),
        (1, 3, 3), (1, 3, 4), (1, 3, 5), (1, 3, 6),
        (1, 4, 4), (1, 4, 5), (1, 4, 6), (1, 4, 7),
        (1, 5, 5), (1, 5, 6), (1, 5, 7), (1, 5, 8),
        (2, 2, 2), (2, 2, 3), (2, 2, 4),
        (2, 3, 3), (2, 3, 4), (2, 3, 6),
        (2, 4, 4), (2, 4, 5), (2, 4, 6),
        (2, 5, 5), (2, 5, 6),
    ]
);

fixed_kernel_table!(
    /// Looks up a fixed-size 3D kernel for the given sizes.
    fixed_derivatives_3d_kernel,
    fixed_3d,
    [
        (1, 2, 2), (1, 2, 3), (1, 2, 4),
        (1, 3, 3), (1, 3, 4), (1, 3, 5),
        (1, 4, 4), (1, 4, 5), (1, 4, 6),
        (1, 5, 5), (1, 5, 6), (1, 5, 8),
        (3, 2, 2), (3, 2, 3), (3, 2, 4),
        (3, 3, 3), (3, 3, 4), (3, 3, 5),
        (3, 4, 4), (3, 4, 5), (3, 4, 6),
        (3, 5, 5), (3, 5, 6),
    ]
);

/// Selects the 2D kernel for the given sizes.
///
/// If `use_fixed` is set and a fixed-size kernel exists, it is returned. Otherwise the
/// runtime-sized kernel is used.
pub fn select_derivatives_2d_kernel<T, L, M, E>(
    vdim: usize,
    d1d: usize,
    q1d: usize,
    use_fixed: bool,
) -> DerivativeKernel<T, E>
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    select_kernel(
        "2D",
        (vdim, d1d, q1d),
        use_fixed,
        fixed_derivatives_2d_kernel::<T, L, M, E>,
        runtime_2d::<T, L, M, E>,
    )
}

/// Selects the 3D kernel for the given sizes.
///
/// If `use_fixed` is set and a fixed-size kernel exists, it is returned. Otherwise the
/// runtime-sized kernel is used.
pub fn select_derivatives_3d_kernel<T, L, M, E>(
    vdim: usize,
    d1d: usize,
    q1d: usize,
    use_fixed: bool,
) -> DerivativeKernel<T, E>
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    select_kernel(
        "3D",
        (vdim, d1d, q1d),
        use_fixed,
        fixed_derivatives_3d_kernel::<T, L, M, E>,
        runtime_3d::<T, L, M, E>,
    )
}

fn select_kernel<T, E>(
    label: &str,
    (vdim, d1d, q1d): (usize, usize, usize),
    use_fixed: bool,
    lookup: fn(usize, usize, usize) -> Option<DerivativeKernel<T, E>>,
    fallback: DerivativeKernel<T, E>,
) -> DerivativeKernel<T, E> {
    if !use_fixed {
        trace!("Using runtime-sized {label} derivative kernel (vdim = {vdim}, d1d = {d1d}, q1d = {q1d})");
        return fallback;
    }
    match lookup(vdim, d1d, q1d) {
        Some(kernel) => {
            trace!("Using fixed-size {label} derivative kernel (vdim = {vdim}, d1d = {d1d}, q1d = {q1d})");
            kernel
        }
        None => {
            debug!(
                "No fixed-size {label} derivative kernel for vdim = {vdim}, d1d = {d1d}, q1d = {q1d}, \
                 falling back to runtime-sized kernel"
            );
            fallback
        }
    }
}
