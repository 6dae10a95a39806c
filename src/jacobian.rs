//! Mapping of reference-space gradients to physical space.
//!
//! Given the Jacobian $J$ of the reference-to-physical map at a point, the physical gradient
//! of a field with reference gradient $\nabla_\xi u$ is
//!
//! $$ \nabla_x u = J^{-T} \nabla_\xi u $$
//!
//! for square Jacobians. For elements embedded in a higher-dimensional space, $J$ is
//! $\mathrm{sdim} \times \mathrm{dim}$ and the inverse is replaced by the left inverse
//! $J^+ = (J^T J)^{-1} J^T$, which yields the gradient tangent to the embedded element.
//!
//! All inverses are computed by closed-form expressions. Singular Jacobians are not detected,
//! and produce non-finite results.
use crate::Real;
use nalgebra::{Matrix2, Matrix2x3, Matrix3, Matrix3x2, SMatrix, SVector, Vector2, Vector3};
use numeric_literals::replace_float_literals;

/// Inverse of a 2x2 matrix by the cofactor formula.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
#[inline(always)]
pub fn inverse_2x2<T: Real>(j: &Matrix2<T>) -> Matrix2<T> {
    let det = j.m11 * j.m22 - j.m12 * j.m21;
    let inv_det = 1.0 / det;
    Matrix2::new(j.m22, -j.m12, -j.m21, j.m11) * inv_det
}

/// Inverse of a 3x3 matrix by the cofactor formula.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
#[inline(always)]
#[rustfmt::skip]
pub fn inverse_3x3<T: Real>(j: &Matrix3<T>) -> Matrix3<T> {
    let c11 = j.m22 * j.m33 - j.m23 * j.m32;
    let c12 = j.m23 * j.m31 - j.m21 * j.m33;
    let c13 = j.m21 * j.m32 - j.m22 * j.m31;
    let det = j.m11 * c11 + j.m12 * c12 + j.m13 * c13;
    let inv_det = 1.0 / det;
    Matrix3::new(
        c11, j.m13 * j.m32 - j.m12 * j.m33, j.m12 * j.m23 - j.m13 * j.m22,
        c12, j.m11 * j.m33 - j.m13 * j.m31, j.m13 * j.m21 - j.m11 * j.m23,
        c13, j.m12 * j.m31 - j.m11 * j.m32, j.m11 * j.m22 - j.m12 * j.m21,
    ) * inv_det
}

/// Left inverse of a single-column Jacobian, i.e. $J^T / (J^T J)$.
///
/// The (row) left inverse is returned as a column vector.
#[inline(always)]
pub fn left_inverse_column<T: Real, const SDIM: usize>(j: &SVector<T, SDIM>) -> SVector<T, SDIM> {
    j / j.dot(j)
}

/// Left inverse $(J^T J)^{-1} J^T$ of a 3x2 Jacobian.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
#[inline(always)]
pub fn left_inverse_3x2<T: Real>(j: &Matrix3x2<T>) -> Matrix2x3<T> {
    let a = j.column(0);
    let b = j.column(1);
    let e = a.dot(&a);
    let g = b.dot(&b);
    let f = a.dot(&b);
    let inv_det = 1.0 / (e * g - f * f);
    let metric_inv = Matrix2::new(g, -f, -f, e) * inv_det;
    metric_inv * j.transpose()
}

/// Maps a reference gradient to physical space with the given `SDIM x DIM` Jacobian.
///
/// The variant is selected from `(DIM, SDIM)` at compile time:
///
/// - `(1, 1)`: division by the scalar Jacobian.
/// - `(1, 2)`, `(1, 3)`: left inverse of the Jacobian column (curves).
/// - `(2, 2)`, `(3, 3)`: transposed inverse.
/// - `(2, 3)`: transposed left inverse (surfaces).
///
/// # Panics
///
/// Panics for any other combination of dimensions.
#[inline(always)]
pub fn transform_reference_gradient<T: Real, const DIM: usize, const SDIM: usize>(
    jacobian: &SMatrix<T, SDIM, DIM>,
    du: &SVector<T, DIM>,
) -> SVector<T, SDIM> {
    match (DIM, SDIM) {
        (1, 1) => SVector::from_element(du[0] / jacobian[(0, 0)]),
        (1, _) => {
            let column: SVector<T, SDIM> = jacobian.column(0).into_owned();
            left_inverse_column(&column) * du[0]
        }
        (2, 2) => {
            let j = Matrix2::from_fn(|r, c| jacobian[(r, c)]);
            let grad = inverse_2x2(&j).transpose() * Vector2::new(du[0], du[1]);
            SVector::from_fn(|i, _| grad[i])
        }
        (2, 3) => {
            let j = Matrix3x2::from_fn(|r, c| jacobian[(r, c)]);
            let grad = left_inverse_3x2(&j).transpose() * Vector2::new(du[0], du[1]);
            SVector::from_fn(|i, _| grad[i])
        }
        (3, 3) => {
            let j = Matrix3::from_fn(|r, c| jacobian[(r, c)]);
            let grad = inverse_3x3(&j).transpose() * Vector3::new(du[0], du[1], du[2]);
            SVector::from_fn(|i, _| grad[i])
        }
        _ => panic!("unsupported Jacobian shape {SDIM}x{DIM}"),
    }
}
