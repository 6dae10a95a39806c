//! Output layouts and derivative modes.
//!
//! Both choices are made at the type level for the kernels, so that every combination
//! compiles to its own loop nest. [`QVectorLayout`] is the corresponding runtime value,
//! used for configuration.
use serde::{Deserialize, Serialize};

/// Ordering of the axes of a quadrature-point output buffer.
///
/// In both layouts the element index is the outermost (slowest) axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QVectorLayout {
    /// Quadrature points vary fastest, then components, then derivative directions.
    #[default]
    ByNodes,
    /// Components vary fastest, then derivative directions, then quadrature points.
    ByVDim,
}

impl QVectorLayout {
    /// Offset of an entry relative to the start of its element's block.
    ///
    /// `q` is the linear quadrature point index, `c` the component and `d` the derivative
    /// direction.
    pub fn element_offset(
        &self,
        q: usize,
        c: usize,
        d: usize,
        num_points: usize,
        vdim: usize,
        num_dirs: usize,
    ) -> usize {
        match self {
            Self::ByNodes => ByNodes::offset(q, c, d, num_points, vdim, num_dirs),
            Self::ByVDim => ByVDim::offset(q, c, d, num_points, vdim, num_dirs),
        }
    }
}

/// Compile-time selection of a [`QVectorLayout`].
pub trait OutputLayout: Send + Sync + 'static {
    const LAYOUT: QVectorLayout;

    fn offset(q: usize, c: usize, d: usize, num_points: usize, vdim: usize, num_dirs: usize) -> usize;
}

/// Type-level [`QVectorLayout::ByNodes`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByNodes;

/// Type-level [`QVectorLayout::ByVDim`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByVDim;

impl OutputLayout for ByNodes {
    const LAYOUT: QVectorLayout = QVectorLayout::ByNodes;

    #[inline(always)]
    fn offset(q: usize, c: usize, d: usize, num_points: usize, vdim: usize, _num_dirs: usize) -> usize {
        q + num_points * (c + vdim * d)
    }
}

impl OutputLayout for ByVDim {
    const LAYOUT: QVectorLayout = QVectorLayout::ByVDim;

    #[inline(always)]
    fn offset(q: usize, c: usize, d: usize, _num_points: usize, vdim: usize, num_dirs: usize) -> usize {
        c + vdim * (d + num_dirs * q)
    }
}

/// Whether derivatives are reported in reference or physical coordinates.
pub trait DerivativeMode: Send + Sync + 'static {
    const PHYSICAL: bool;
}

/// Derivatives with respect to reference coordinates. Jacobians are not read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reference;

/// Derivatives with respect to physical coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Physical;

impl DerivativeMode for Reference {
    const PHYSICAL: bool = false;
}

impl DerivativeMode for Physical {
    const PHYSICAL: bool = true;
}
