//! Checked front end for the derivative kernels.
use crate::basis::{BasisTables, BasisView};
use crate::dispatch::{default_batch_size_2d, ElementExecutor, RayonExecutor};
use crate::error::{check_len, GradientError};
use crate::kernels::{
    derivatives_1d, fixed_derivatives_2d_kernel, fixed_derivatives_3d_kernel, select_derivatives_2d_kernel,
    select_derivatives_3d_kernel, DerivativeInput, MAX_D1D, MAX_D1D_3D, MAX_Q1D, MAX_Q1D_3D,
};
use crate::layout::{ByNodes, ByVDim, DerivativeMode, OutputLayout, Physical, QVectorLayout, Reference};
use crate::Real;
use log::trace;
use serde::{Deserialize, Serialize};

/// Reference shape of the elements in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementShape {
    Segment,
    Quadrilateral,
    Hexahedron,
}

impl ElementShape {
    /// The intrinsic dimension of the shape.
    pub fn dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Quadrilateral => 2,
            Self::Hexahedron => 3,
        }
    }

    /// Number of quadrature points per element for `q1d` points per dimension.
    pub fn num_points(&self, q1d: usize) -> usize {
        q1d.pow(self.dim() as u32)
    }

    /// Number of DOFs per element and component for `d1d` DOFs per dimension.
    pub fn num_dofs(&self, d1d: usize) -> usize {
        d1d.pow(self.dim() as u32)
    }
}

/// Configuration of a [`QuadratureInterpolator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolatorOptions {
    pub layout: QVectorLayout,
    /// Whether to use fixed-size kernels where available.
    pub use_fixed_kernels: bool,
    /// Number of elements per batch for 2D elements, must be positive. Chosen from `q1d` if
    /// not given.
    pub elements_per_batch: Option<usize>,
}

impl Default for InterpolatorOptions {
    fn default() -> Self {
        Self {
            layout: QVectorLayout::ByNodes,
            use_fixed_kernels: true,
            elements_per_batch: None,
        }
    }
}

/// Evaluates derivatives of element fields at the quadrature points of a tensor-product rule.
///
/// All input is validated before the kernels are invoked, and problems are reported as
/// [`GradientError`]. Singular Jacobians are not detected.
#[derive(Debug, Clone)]
pub struct QuadratureInterpolator<'a, T, E = RayonExecutor> {
    basis: BasisView<'a, T>,
    shape: ElementShape,
    options: InterpolatorOptions,
    executor: E,
}

impl<'a, T: Real> QuadratureInterpolator<'a, T, RayonExecutor> {
    pub fn new(basis: &'a BasisTables<T>, shape: ElementShape) -> Self {
        Self {
            basis: basis.view(),
            shape,
            options: InterpolatorOptions::default(),
            executor: RayonExecutor::default(),
        }
    }
}

impl<'a, T: Real, E: ElementExecutor> QuadratureInterpolator<'a, T, E> {
    pub fn with_executor<E2: ElementExecutor>(self, executor: E2) -> QuadratureInterpolator<'a, T, E2> {
        QuadratureInterpolator {
            basis: self.basis,
            shape: self.shape,
            options: self.options,
            executor,
        }
    }

    pub fn with_options(self, options: InterpolatorOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_layout(mut self, layout: QVectorLayout) -> Self {
        self.options.layout = layout;
        self
    }

    pub fn with_fixed_kernels(mut self, use_fixed_kernels: bool) -> Self {
        self.options.use_fixed_kernels = use_fixed_kernels;
        self
    }

    pub fn with_elements_per_batch(mut self, elements_per_batch: usize) -> Self {
        self.options.elements_per_batch = Some(elements_per_batch.max(1));
        self
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    pub fn options(&self) -> &InterpolatorOptions {
        &self.options
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Length of the output buffer for the given number of elements, components and
    /// derivative directions.
    pub fn output_len(&self, num_elements: usize, vdim: usize, num_directions: usize) -> usize {
        num_elements * self.shape.num_points(self.basis.q1d) * vdim * num_directions
    }

    /// Length of the Jacobian buffer for the given number of elements and space dimension.
    pub fn jacobians_len(&self, num_elements: usize, sdim: usize) -> usize {
        num_elements * self.shape.num_points(self.basis.q1d) * sdim * self.shape.dim()
    }

    /// Computes derivatives with respect to reference coordinates.
    ///
    /// The output has `dim` directions, where `dim` is the dimension of the element shape.
    pub fn derivatives(
        &self,
        num_elements: usize,
        vdim: usize,
        dofs: &[T],
        output: &mut [T],
    ) -> Result<(), GradientError> {
        let dim = self.shape.dim();
        let input = self.validated_input(num_elements, vdim, dim, &[], dofs, output, false)?;
        match self.options.layout {
            QVectorLayout::ByNodes => self.run::<ByNodes, Reference>(&input, output),
            QVectorLayout::ByVDim => self.run::<ByVDim, Reference>(&input, output),
        }
        Ok(())
    }

    /// Computes derivatives with respect to physical coordinates.
    ///
    /// The output has `sdim` directions. `sdim` must be at least the dimension of the element
    /// shape and at most 3 (embedded hexahedra are not supported).
    pub fn physical_derivatives(
        &self,
        num_elements: usize,
        vdim: usize,
        sdim: usize,
        jacobians: &[T],
        dofs: &[T],
        output: &mut [T],
    ) -> Result<(), GradientError> {
        let input = self.validated_input(num_elements, vdim, sdim, jacobians, dofs, output, true)?;
        match self.options.layout {
            QVectorLayout::ByNodes => self.run::<ByNodes, Physical>(&input, output),
            QVectorLayout::ByVDim => self.run::<ByVDim, Physical>(&input, output),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn validated_input<'b>(
        &self,
        num_elements: usize,
        vdim: usize,
        sdim: usize,
        jacobians: &'b [T],
        dofs: &'b [T],
        output: &[T],
        physical: bool,
    ) -> Result<DerivativeInput<'b, T>, GradientError>
    where
        'a: 'b,
    {
        let dim = self.shape.dim();
        let BasisView { d1d, q1d, .. } = self.basis;

        if vdim == 0 {
            return Err(GradientError::ZeroSize { parameter: "vdim" });
        }
        if self.options.elements_per_batch == Some(0) {
            return Err(GradientError::ZeroSize {
                parameter: "elements_per_batch",
            });
        }
        if sdim < dim || sdim > 3 {
            return Err(GradientError::UnsupportedSpaceDim { dim, sdim });
        }
        self.check_maxima(vdim, d1d, q1d)?;

        check_len("dofs", num_elements * self.shape.num_dofs(d1d) * vdim, dofs.len())?;
        if physical {
            check_len("jacobians", self.jacobians_len(num_elements, sdim), jacobians.len())?;
        }

        let input = DerivativeInput {
            num_elements,
            basis: self.basis,
            jacobians,
            dofs,
            vdim,
            sdim,
        };
        let num_directions = input.num_directions(dim, physical);
        check_len("output", self.output_len(num_elements, vdim, num_directions), output.len())?;
        Ok(input)
    }

    fn uses_fixed_kernel(&self, vdim: usize, d1d: usize, q1d: usize) -> bool {
        self.options.use_fixed_kernels
            && match self.shape {
                ElementShape::Segment => false,
                ElementShape::Quadrilateral => {
                    fixed_derivatives_2d_kernel::<T, ByNodes, Reference, E>(vdim, d1d, q1d).is_some()
                }
                ElementShape::Hexahedron => {
                    fixed_derivatives_3d_kernel::<T, ByNodes, Reference, E>(vdim, d1d, q1d).is_some()
                }
            }
    }

    fn check_maxima(&self, vdim: usize, d1d: usize, q1d: usize) -> Result<(), GradientError> {
        if self.uses_fixed_kernel(vdim, d1d, q1d) {
            return Ok(());
        }
        // Segments are contracted directly and need no scratch
        let (max_d1d, max_q1d) = match self.shape {
            ElementShape::Segment => return Ok(()),
            ElementShape::Quadrilateral => (MAX_D1D, MAX_Q1D),
            ElementShape::Hexahedron => (MAX_D1D_3D, MAX_Q1D_3D),
        };
        if d1d > max_d1d {
            return Err(GradientError::ExceedsMaximum {
                parameter: "d1d",
                value: d1d,
                max: max_d1d,
            });
        }
        if q1d > max_q1d {
            return Err(GradientError::ExceedsMaximum {
                parameter: "q1d",
                value: q1d,
                max: max_q1d,
            });
        }
        Ok(())
    }

    fn run<L: OutputLayout, M: DerivativeMode>(&self, input: &DerivativeInput<T>, output: &mut [T]) {
        let BasisView { d1d, q1d, .. } = self.basis;
        let vdim = input.vdim;
        trace!(
            "Computing {} derivatives for {} {:?} elements ({:?} layout)",
            if M::PHYSICAL { "physical" } else { "reference" },
            input.num_elements,
            self.shape,
            L::LAYOUT
        );
        match self.shape {
            ElementShape::Segment => derivatives_1d::<T, L, M, E>(&self.executor, input, output),
            ElementShape::Quadrilateral => {
                let batch_size = self
                    .options
                    .elements_per_batch
                    .unwrap_or_else(|| default_batch_size_2d(q1d));
                let kernel = select_derivatives_2d_kernel::<T, L, M, E>(vdim, d1d, q1d, self.options.use_fixed_kernels);
                kernel(&self.executor, input, batch_size, output)
            }
            ElementShape::Hexahedron => {
                let kernel = select_derivatives_3d_kernel::<T, L, M, E>(vdim, d1d, q1d, self.options.use_fixed_kernels);
                kernel(&self.executor, input, 1, output)
            }
        }
    }
}
