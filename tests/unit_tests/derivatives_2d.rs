use crate::unit_tests::{constant_jacobians, interpolate_2d, quadrature_points, OutputReader};
use fenris_qinterp::basis::BasisTables;
use fenris_qinterp::dispatch::SerialExecutor;
use fenris_qinterp::interpolator::{ElementShape, QuadratureInterpolator};
use fenris_qinterp::kernels::{derivatives_2d, DerivativeInput, FixedDims, RuntimeDims};
use fenris_qinterp::layout::{ByNodes, ByVDim, Physical, QVectorLayout, Reference};
use matrixcompare::assert_scalar_eq;
use nalgebra::{DMatrix, Matrix3x2, Vector3};
use util::assert_slices_approx_eq;

#[test]
fn linear_field_on_reference_quad() {
    // Field u = x with a quadratic basis and 4 Gauss points per direction
    let basis = BasisTables::<f64>::gauss_lagrange(3, 4);
    let dofs = interpolate_2d(3, |x, _| x);
    let interpolator = QuadratureInterpolator::new(&basis, ElementShape::Quadrilateral);

    let mut output = vec![0.0; 16 * 2];
    interpolator.derivatives(1, 1, &dofs, &mut output).unwrap();

    for q in 0..16 {
        assert_scalar_eq!(output[q], 1.0, comp = abs, tol = 1e-13);
        assert_scalar_eq!(output[16 + q], 0.0, comp = abs, tol = 1e-13);
    }

    // An affine map scaling x by 2 halves the x-derivative
    let jacobian = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]);
    let jacobians = constant_jacobians(1, 16, &jacobian);
    interpolator
        .physical_derivatives(1, 1, 2, &jacobians, &dofs, &mut output)
        .unwrap();

    for q in 0..16 {
        assert_scalar_eq!(output[q], 0.5, comp = abs, tol = 1e-13);
        assert_scalar_eq!(output[16 + q], 0.0, comp = abs, tol = 1e-13);
    }
}

#[test]
fn bilinear_field_has_expected_reference_gradient() {
    // u = x y  =>  du/dx = y, du/dy = x
    let basis = BasisTables::<f64>::gauss_lagrange(2, 3);
    let dofs = interpolate_2d(2, |x, y| x * y);
    let interpolator = QuadratureInterpolator::new(&basis, ElementShape::Quadrilateral);

    let mut output = vec![0.0; 9 * 2];
    interpolator.derivatives(1, 1, &dofs, &mut output).unwrap();

    let reader = OutputReader {
        output: &output,
        layout: QVectorLayout::ByNodes,
        num_points: 9,
        vdim: 1,
        num_dirs: 2,
    };
    for (q, [x, y, _]) in quadrature_points(&basis, 2).into_iter().enumerate() {
        assert_scalar_eq!(reader.get(0, q, 0, 0), y, comp = abs, tol = 1e-13);
        assert_scalar_eq!(reader.get(0, q, 0, 1), x, comp = abs, tol = 1e-13);
    }
}

#[test]
fn vector_field_with_varying_affine_maps() {
    // Each element has its own affine map x = A_e xi + b_e. With the field components
    // u_c(x) = g_c . x the physical gradient of component c is g_c everywhere.
    let (d1d, q1d, vdim, num_elements) = (3, 3, 2, 3);
    let num_points = q1d * q1d;
    let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
    let maps = [
        DMatrix::from_row_slice(2, 2, &[2.0, 0.5, -0.3, 1.5]),
        DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
        DMatrix::from_row_slice(2, 2, &[0.7, -0.2, 0.4, 3.0]),
    ];
    let offsets = [[0.0, 1.0], [-2.0, 0.5], [3.0, 3.0]];
    let gradients = [[1.0, -2.0], [0.25, 4.0]];

    let mut dofs = Vec::new();
    let mut jacobians = Vec::new();
    for (a, b) in maps.iter().zip(&offsets) {
        for g in &gradients {
            dofs.extend(interpolate_2d(d1d, |xi, eta| {
                let x = a[(0, 0)] * xi + a[(0, 1)] * eta + b[0];
                let y = a[(1, 0)] * xi + a[(1, 1)] * eta + b[1];
                g[0] * x + g[1] * y
            }));
        }
        jacobians.extend(constant_jacobians(1, num_points, a));
    }

    for layout in [QVectorLayout::ByNodes, QVectorLayout::ByVDim] {
        let interpolator = QuadratureInterpolator::new(&basis, ElementShape::Quadrilateral).with_layout(layout);
        let mut output = vec![0.0; interpolator.output_len(num_elements, vdim, 2)];
        interpolator
            .physical_derivatives(num_elements, vdim, 2, &jacobians, &dofs, &mut output)
            .unwrap();

        let reader = OutputReader {
            output: &output,
            layout,
            num_points,
            vdim,
            num_dirs: 2,
        };
        for e in 0..num_elements {
            for q in 0..num_points {
                for (c, g) in gradients.iter().enumerate() {
                    assert_scalar_eq!(reader.get(e, q, c, 0), g[0], comp = abs, tol = 1e-12);
                    assert_scalar_eq!(reader.get(e, q, c, 1), g[1], comp = abs, tol = 1e-12);
                }
            }
        }
    }
}

#[test]
fn embedded_quad_gradient_is_tangential_projection() {
    // Flat quadrilateral in 3D with x = A xi, and u(x) = c . x
    let a = Matrix3x2::new(1.0, 0.0, 0.5, 2.0, 1.0, -1.0);
    let c = Vector3::new(1.0, -1.0, 3.0);
    let expected = a * (a.transpose() * a).try_inverse().unwrap() * a.transpose() * c;
    let normal = a.column(0).cross(&a.column(1));

    let basis = BasisTables::<f64>::gauss_lagrange(2, 3);
    let dofs = interpolate_2d(2, |xi, eta| c.dot(&(a * nalgebra::Vector2::new(xi, eta))));
    let jacobian = DMatrix::from_fn(3, 2, |i, j| a[(i, j)]);
    let jacobians = constant_jacobians(1, 9, &jacobian);

    let interpolator = QuadratureInterpolator::new(&basis, ElementShape::Quadrilateral);
    let mut output = vec![0.0; 9 * 3];
    interpolator
        .physical_derivatives(1, 1, 3, &jacobians, &dofs, &mut output)
        .unwrap();

    for q in 0..9 {
        let grad = Vector3::new(output[q], output[9 + q], output[18 + q]);
        assert_scalar_eq!(grad.dot(&normal), 0.0, comp = abs, tol = 1e-12);
        for i in 0..3 {
            assert_scalar_eq!(grad[i], expected[i], comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn identity_jacobian_reproduces_reference_derivatives() {
    let (d1d, q1d, vdim, num_elements) = (4, 5, 2, 3);
    let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
    let dofs: Vec<f64> = (0..d1d * d1d * vdim * num_elements)
        .map(|i| ((i * 7919) % 23) as f64 - 11.0)
        .collect();
    let jacobians = constant_jacobians(num_elements, q1d * q1d, &DMatrix::identity(2, 2));

    let interpolator = QuadratureInterpolator::new(&basis, ElementShape::Quadrilateral);
    let mut reference = vec![0.0; interpolator.output_len(num_elements, vdim, 2)];
    let mut physical = reference.clone();
    interpolator
        .derivatives(num_elements, vdim, &dofs, &mut reference)
        .unwrap();
    interpolator
        .physical_derivatives(num_elements, vdim, 2, &jacobians, &dofs, &mut physical)
        .unwrap();

    assert_eq!(reference, physical);
}

#[test]
fn fixed_and_runtime_kernels_agree() {
    let (d1d, q1d, vdim, num_elements) = (3, 4, 1, 5);
    let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
    let dofs: Vec<f64> = (0..d1d * d1d * vdim * num_elements)
        .map(|i| (i as f64 * 0.37).sin())
        .collect();
    let input = DerivativeInput {
        num_elements,
        basis: basis.view(),
        jacobians: &[],
        dofs: &dofs,
        vdim,
        sdim: 2,
    };
    let len = num_elements * q1d * q1d * vdim * 2;

    let mut fixed = vec![0.0; len];
    let mut runtime = vec![0.0; len];
    derivatives_2d::<f64, ByVDim, Reference, _, _>(&SerialExecutor, &input, FixedDims::<1, 3, 4>, 2, &mut fixed);
    derivatives_2d::<f64, ByVDim, Reference, _, _>(
        &SerialExecutor,
        &input,
        RuntimeDims::from_input(&input),
        3,
        &mut runtime,
    );

    assert_slices_approx_eq!(fixed, runtime, abstol = 1e-14);
}

#[test]
fn batch_size_does_not_change_results() {
    let (d1d, q1d, vdim, num_elements) = (2, 3, 2, 7);
    let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
    let dofs: Vec<f64> = (0..d1d * d1d * vdim * num_elements)
        .map(|i| (i as f64).sqrt())
        .collect();
    let jacobian = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
    let jacobians = constant_jacobians(num_elements, q1d * q1d, &jacobian);
    let input = DerivativeInput {
        num_elements,
        basis: basis.view(),
        jacobians: &jacobians,
        dofs: &dofs,
        vdim,
        sdim: 2,
    };
    let len = num_elements * q1d * q1d * vdim * 2;

    let mut expected = vec![0.0; len];
    derivatives_2d::<f64, ByNodes, Physical, _, _>(
        &SerialExecutor,
        &input,
        RuntimeDims::from_input(&input),
        1,
        &mut expected,
    );
    for batch_size in [2, 3, 16] {
        let mut output = vec![0.0; len];
        derivatives_2d::<f64, ByNodes, Physical, _, _>(
            &SerialExecutor,
            &input,
            RuntimeDims::from_input(&input),
            batch_size,
            &mut output,
        );
        assert_eq!(output, expected);
    }
}
