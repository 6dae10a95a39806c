use crate::unit_tests::varying_jacobians;
use fenris_qinterp::basis::BasisTables;
use fenris_qinterp::dispatch::{default_batch_size_2d, RayonExecutor, SerialExecutor};
use fenris_qinterp::interpolator::{ElementShape, QuadratureInterpolator};
use fenris_qinterp::kernels::{fixed_derivatives_2d_kernel, fixed_derivatives_3d_kernel};
use fenris_qinterp::layout::{ByNodes, Physical, QVectorLayout, Reference};

#[test]
fn serial_and_parallel_execution_agree_exactly() {
    let cases = [
        (ElementShape::Segment, 1, 4, 5),
        (ElementShape::Quadrilateral, 2, 3, 4),
        (ElementShape::Quadrilateral, 1, 7, 9),
        (ElementShape::Hexahedron, 3, 3, 4),
        (ElementShape::Hexahedron, 2, 3, 3),
    ];
    let num_elements = 37;

    for (shape, vdim, d1d, q1d) in cases {
        let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
        let dim = shape.dim();
        let num_points = shape.num_points(q1d);
        let dofs: Vec<f64> = (0..num_elements * vdim * shape.num_dofs(d1d))
            .map(|i| (0.13 * i as f64).sin())
            .collect();
        let jacobians = varying_jacobians(dim, num_elements, num_points);

        for layout in [QVectorLayout::ByNodes, QVectorLayout::ByVDim] {
            let parallel = QuadratureInterpolator::new(&basis, shape)
                .with_layout(layout)
                .with_executor(RayonExecutor::default().with_min_batches_per_task(1));
            let serial = parallel.clone().with_executor(SerialExecutor);

            let len = parallel.output_len(num_elements, vdim, dim);
            let (mut a, mut b) = (vec![0.0; len], vec![0.0; len]);
            parallel.derivatives(num_elements, vdim, &dofs, &mut a).unwrap();
            serial.derivatives(num_elements, vdim, &dofs, &mut b).unwrap();
            assert_eq!(a, b);

            parallel
                .physical_derivatives(num_elements, vdim, dim, &jacobians, &dofs, &mut a)
                .unwrap();
            serial
                .physical_derivatives(num_elements, vdim, dim, &jacobians, &dofs, &mut b)
                .unwrap();
            assert_eq!(a, b);
        }
    }
}

#[test]
fn min_batches_per_task_is_at_least_one() {
    assert_eq!(RayonExecutor::default().min_batches_per_task(), 8);
    assert_eq!(RayonExecutor::default().with_min_batches_per_task(0).min_batches_per_task(), 1);
    assert_eq!(RayonExecutor::default().with_min_batches_per_task(3).min_batches_per_task(), 3);
}

#[test]
fn default_batch_size_decreases_with_quadrature_size() {
    assert_eq!(default_batch_size_2d(1), 16);
    assert_eq!(default_batch_size_2d(2), 16);
    assert_eq!(default_batch_size_2d(4), 8);
    assert_eq!(default_batch_size_2d(6), 4);
    assert_eq!(default_batch_size_2d(8), 2);
    assert_eq!(default_batch_size_2d(9), 1);
    assert_eq!(default_batch_size_2d(14), 1);
    assert!((1..20)
        .map(default_batch_size_2d)
        .collect::<Vec<_>>()
        .windows(2)
        .all(|w| w[0] >= w[1]));
}

#[test]
fn fixed_kernel_lookup() {
    type E = SerialExecutor;
    assert!(fixed_derivatives_2d_kernel::<f64, ByNodes, Reference, E>(1, 3, 4).is_some());
    assert!(fixed_derivatives_2d_kernel::<f64, ByNodes, Physical, E>(2, 2, 2).is_some());
    assert!(fixed_derivatives_2d_kernel::<f64, ByNodes, Reference, E>(3, 3, 4).is_none());
    assert!(fixed_derivatives_2d_kernel::<f64, ByNodes, Reference, E>(1, 9, 9).is_none());

    assert!(fixed_derivatives_3d_kernel::<f64, ByNodes, Reference, E>(3, 2, 3).is_some());
    assert!(fixed_derivatives_3d_kernel::<f64, ByNodes, Physical, E>(1, 4, 5).is_some());
    assert!(fixed_derivatives_3d_kernel::<f64, ByNodes, Reference, E>(2, 3, 3).is_none());
}

#[test]
fn fixed_and_runtime_selection_agree_through_interpolator() {
    // Covers both combinations with and without a fixed-size kernel
    let num_elements = 5;
    for (shape, vdim, d1d, q1d) in [
        (ElementShape::Quadrilateral, 2, 3, 4),
        (ElementShape::Quadrilateral, 3, 3, 4),
        (ElementShape::Hexahedron, 1, 3, 4),
    ] {
        let basis = BasisTables::<f64>::gauss_lagrange(d1d, q1d);
        let dofs: Vec<f64> = (0..num_elements * vdim * shape.num_dofs(d1d))
            .map(|i| 1.0 / (1.0 + i as f64))
            .collect();
        let fixed = QuadratureInterpolator::new(&basis, shape).with_executor(SerialExecutor);
        let runtime = fixed.clone().with_fixed_kernels(false);

        let len = fixed.output_len(num_elements, vdim, shape.dim());
        let (mut a, mut b) = (vec![0.0; len], vec![0.0; len]);
        fixed.derivatives(num_elements, vdim, &dofs, &mut a).unwrap();
        runtime.derivatives(num_elements, vdim, &dofs, &mut b).unwrap();
        util::assert_slices_approx_eq!(a, b, abstol = 1e-13);
    }
}
