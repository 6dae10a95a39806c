use crate::dispatch::ElementExecutor;
use crate::jacobian::transform_reference_gradient;
use crate::kernels::{DerivativeInput, KernelDims, Scratch2d};
use crate::layout::{DerivativeMode, OutputLayout};
use crate::Real;
use nalgebra::{SMatrix, SVector, Vector2};

/// Derivatives of fields on quadrilateral elements at the tensor-product quadrature points.
///
/// Elements are processed in batches of `batch_size` elements that share scratch buffers.
/// Physical derivatives on surfaces embedded in 3D (`input.sdim == 3`) use the left inverse
/// of the Jacobian.
pub fn derivatives_2d<T, L, M, E, Dims>(
    executor: &E,
    input: &DerivativeInput<T>,
    dims: Dims,
    batch_size: usize,
    output: &mut [T],
) where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
    Dims: KernelDims,
{
    if M::PHYSICAL && input.sdim == 3 {
        derivatives_2d_impl::<T, L, M, E, Dims, 3>(executor, input, dims, batch_size, output)
    } else {
        debug_assert!(!M::PHYSICAL || input.sdim == 2, "sdim must be 2 or 3 for 2D elements");
        derivatives_2d_impl::<T, L, M, E, Dims, 2>(executor, input, dims, batch_size, output)
    }
}

#[inline(always)]
fn derivatives_2d_impl<T, L, M, E, Dims, const SDIM: usize>(
    executor: &E,
    input: &DerivativeInput<T>,
    dims: Dims,
    batch_size: usize,
    output: &mut [T],
) where
    T: Real,
    L: OutputLayout,
    M: DerivativeMode,
    E: ElementExecutor,
    Dims: KernelDims,
{
    let vdim = dims.vdim();
    let d1d = dims.d1d();
    let q1d = dims.q1d();
    let num_points = q1d * q1d;
    let element_len = num_points * vdim * SDIM;
    let element_dofs = d1d * d1d;
    let basis = input.basis;

    debug_assert_eq!((basis.d1d, basis.q1d, input.vdim), (d1d, q1d, vdim));
    debug_assert_eq!(input.dofs.len(), element_dofs * vdim * input.num_elements);
    debug_assert_eq!(output.len(), element_len * input.num_elements);
    debug_assert!(!M::PHYSICAL || input.jacobians.len() == num_points * SDIM * 2 * input.num_elements);

    executor.for_each_element_batch(output, element_len, batch_size, |first_element, batch| {
        dims.with_scratch_2d(|s: Scratch2d<T>| {
            for (i, y) in batch.chunks_exact_mut(element_len).enumerate() {
                let e = first_element + i;
                for c in 0..vdim {
                    let dof_offset = element_dofs * (c + vdim * e);
                    s.x.copy_from_slice(&input.dofs[dof_offset..dof_offset + element_dofs]);

                    // Contract along x: DQ0(dy, qx) with B, DQ1(dy, qx) with G
                    for dy in 0..d1d {
                        for qx in 0..q1d {
                            let mut u = T::zero();
                            let mut v = T::zero();
                            for dx in 0..d1d {
                                let value = s.x[dx + d1d * dy];
                                u += value * basis.value(qx, dx);
                                v += value * basis.derivative(qx, dx);
                            }
                            s.dq0[qx + q1d * dy] = u;
                            s.dq1[qx + q1d * dy] = v;
                        }
                    }

                    // The x-pass is complete for all dy, so the y-pass may read across rows
                    for qy in 0..q1d {
                        for qx in 0..q1d {
                            let mut du = Vector2::<T>::zeros();
                            for dy in 0..d1d {
                                du[0] += s.dq1[qx + q1d * dy] * basis.value(qy, dy);
                                du[1] += s.dq0[qx + q1d * dy] * basis.derivative(qy, dy);
                            }

                            let q = qx + q1d * qy;
                            let grad: SVector<T, SDIM> = if M::PHYSICAL {
                                let jacobian = SMatrix::<T, SDIM, 2>::from_fn(|row, col| {
                                    input.jacobians[q + num_points * (row + SDIM * (col + 2 * e))]
                                });
                                transform_reference_gradient(&jacobian, &du)
                            } else {
                                SVector::from_fn(|d, _| du[d])
                            };

                            for d in 0..SDIM {
                                y[L::offset(q, c, d, num_points, vdim, SDIM)] = grad[d];
                            }
                        }
                    }
                }
            }
        })
    });
}
