use crate::dispatch::ElementExecutor;
use crate::jacobian::transform_reference_gradient;
use crate::kernels::{DerivativeInput, KernelDims, Scratch3d};
use crate::layout::{DerivativeMode, OutputLayout};
use crate::Real;
use nalgebra::{Matrix3, Vector3};

/// Derivatives of fields on hexahedral elements at the tensor-product quadrature points.
///
/// Each element is contracted in three passes (x, y, z). Physical derivatives always have
/// three directions, and the Jacobian buffer holds one 3x3 matrix per point.
pub fn derivatives_3d<T, L, M, E, Dims>(
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
    let num_points = q1d * q1d * q1d;
    let element_len = num_points * vdim * 3;
    let element_dofs = d1d * d1d * d1d;
    let basis = input.basis;

    debug_assert_eq!((basis.d1d, basis.q1d, input.vdim), (d1d, q1d, vdim));
    debug_assert!(!M::PHYSICAL || input.sdim == 3, "sdim must be 3 for 3D elements");
    debug_assert_eq!(input.dofs.len(), element_dofs * vdim * input.num_elements);
    debug_assert_eq!(output.len(), element_len * input.num_elements);
    debug_assert!(!M::PHYSICAL || input.jacobians.len() == num_points * 9 * input.num_elements);

    executor.for_each_element_batch(output, element_len, batch_size, |first_element, batch| {
        dims.with_scratch_3d(|s: Scratch3d<T>| {
            for (i, y) in batch.chunks_exact_mut(element_len).enumerate() {
                let e = first_element + i;
                for c in 0..vdim {
                    let dof_offset = element_dofs * (c + vdim * e);
                    s.x.copy_from_slice(&input.dofs[dof_offset..dof_offset + element_dofs]);

                    // x-pass: DDQ0(dz, dy, qx) with B, DDQ1(dz, dy, qx) with G
                    for dz in 0..d1d {
                        for dy in 0..d1d {
                            for qx in 0..q1d {
                                let mut u = T::zero();
                                let mut v = T::zero();
                                for dx in 0..d1d {
                                    let value = s.x[dx + d1d * (dy + d1d * dz)];
                                    u += value * basis.value(qx, dx);
                                    v += value * basis.derivative(qx, dx);
                                }
                                let idx = qx + q1d * (dy + d1d * dz);
                                s.ddq0[idx] = u;
                                s.ddq1[idx] = v;
                            }
                        }
                    }

                    // y-pass: partial contractions for d/dx, d/dy and the value along y
                    for dz in 0..d1d {
                        for qy in 0..q1d {
                            for qx in 0..q1d {
                                let mut u = T::zero();
                                let mut v = T::zero();
                                let mut w = T::zero();
                                for dy in 0..d1d {
                                    let idx = qx + q1d * (dy + d1d * dz);
                                    u += s.ddq1[idx] * basis.value(qy, dy);
                                    v += s.ddq0[idx] * basis.derivative(qy, dy);
                                    w += s.ddq0[idx] * basis.value(qy, dy);
                                }
                                let idx = qx + q1d * (qy + q1d * dz);
                                s.dqq0[idx] = u;
                                s.dqq1[idx] = v;
                                s.dqq2[idx] = w;
                            }
                        }
                    }

                    // z-pass
                    for qz in 0..q1d {
                        for qy in 0..q1d {
                            for qx in 0..q1d {
                                let mut du = Vector3::<T>::zeros();
                                for dz in 0..d1d {
                                    let idx = qx + q1d * (qy + q1d * dz);
                                    du[0] += s.dqq0[idx] * basis.value(qz, dz);
                                    du[1] += s.dqq1[idx] * basis.value(qz, dz);
                                    du[2] += s.dqq2[idx] * basis.derivative(qz, dz);
                                }

                                let q = qx + q1d * (qy + q1d * qz);
                                let grad = if M::PHYSICAL {
                                    let jacobian = Matrix3::from_fn(|row, col| {
                                        input.jacobians[q + num_points * (row + 3 * (col + 3 * e))]
                                    });
                                    transform_reference_gradient(&jacobian, &du)
                                } else {
                                    du
                                };

                                for d in 0..3 {
                                    y[L::offset(q, c, d, num_points, vdim, 3)] = grad[d];
                                }
                            }
                        }
                    }
                }
            }
        })
    });
}
