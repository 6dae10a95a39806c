use crate::dispatch::ElementExecutor;
use crate::jacobian::transform_reference_gradient;
use crate::kernels::DerivativeInput;
use crate::layout::{DerivativeMode, OutputLayout};
use crate::Real;
use nalgebra::{SMatrix, SVector, Vector1};

/// Derivatives of fields on segment elements at the quadrature points.
///
/// Segments have no tensor structure to exploit, so each derivative is a direct contraction
/// with the derivative table. Physical derivatives of curves embedded in 2D or 3D
/// (`input.sdim > 1`) have `sdim` directions.
pub fn derivatives_1d<T, L, M, E>(executor: &E, input: &DerivativeInput<T>, output: &mut [T])
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    match input.sdim {
        2 if M::PHYSICAL => derivatives_1d_impl::<T, L, M, E, 2>(executor, input, output),
        3 if M::PHYSICAL => derivatives_1d_impl::<T, L, M, E, 3>(executor, input, output),
        _ => {
            debug_assert!(!M::PHYSICAL || input.sdim == 1, "sdim must be 1, 2 or 3 for 1D elements");
            derivatives_1d_impl::<T, L, M, E, 1>(executor, input, output)
        }
    }
}

fn derivatives_1d_impl<T, L, M, E, const SDIM: usize>(executor: &E, input: &DerivativeInput<T>, output: &mut [T])
where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
{
    let vdim = input.vdim;
    let d1d = input.basis.d1d;
    let q1d = input.basis.q1d;
    let element_len = q1d * vdim * SDIM;
    let basis = input.basis;

    debug_assert_eq!(input.dofs.len(), d1d * vdim * input.num_elements);
    debug_assert_eq!(output.len(), element_len * input.num_elements);
    debug_assert!(!M::PHYSICAL || input.jacobians.len() == q1d * SDIM * input.num_elements);

    executor.for_each_element_batch(output, element_len, 1, |e, y| {
        for c in 0..vdim {
            let x = &input.dofs[d1d * (c + vdim * e)..d1d * (c + vdim * e + 1)];
            for q in 0..q1d {
                let mut du = Vector1::<T>::zeros();
                for (d, &x_d) in x.iter().enumerate() {
                    du[0] += basis.derivative(q, d) * x_d;
                }

                let grad: SVector<T, SDIM> = if M::PHYSICAL {
                    let jacobian = SMatrix::<T, SDIM, 1>::from_fn(|row, _| input.jacobians[q + q1d * (row + SDIM * e)]);
                    transform_reference_gradient(&jacobian, &du)
                } else {
                    SVector::from_element(du[0])
                };

                for d in 0..SDIM {
                    y[L::offset(q, c, d, q1d, vdim, SDIM)] = grad[d];
                }
            }
        }
    });
}
