//! Strategies for property-based testing of the derivative kernels.
use crate::interpolator::ElementShape;
use ::proptest::collection::vec;
use ::proptest::prelude::*;

/// Sizes of an element batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSizes {
    pub shape: ElementShape,
    pub num_elements: usize,
    pub vdim: usize,
    pub d1d: usize,
    pub q1d: usize,
}

impl BatchSizes {
    pub fn num_dofs(&self) -> usize {
        self.num_elements * self.vdim * self.shape.num_dofs(self.d1d)
    }

    pub fn num_points(&self) -> usize {
        self.shape.num_points(self.q1d)
    }
}

pub fn element_shape() -> impl Strategy<Value = ElementShape> {
    prop_oneof![
        Just(ElementShape::Segment),
        Just(ElementShape::Quadrilateral),
        Just(ElementShape::Hexahedron)
    ]
}

/// Small batch sizes for the given shape.
///
/// Sizes are kept small, since the number of DOFs and quadrature points grows with the
/// power of the dimension.
pub fn batch_sizes(shape: ElementShape) -> impl Strategy<Value = BatchSizes> {
    let max_1d: usize = match shape {
        ElementShape::Hexahedron => 4,
        _ => 6,
    };
    (0..=6usize, 1..=3usize, 1..=max_1d, 1..=max_1d).prop_map(move |(num_elements, vdim, d1d, q1d)| BatchSizes {
        shape,
        num_elements,
        vdim,
        d1d,
        q1d,
    })
}

/// Batch sizes together with DOF values in `[-10, 10]`.
pub fn batch_with_dofs(shape: ElementShape) -> impl Strategy<Value = (BatchSizes, Vec<f64>)> {
    batch_sizes(shape).prop_flat_map(|sizes| (Just(sizes), vec(-10.0..10.0, sizes.num_dofs())))
}
