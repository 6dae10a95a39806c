//! Tabulated one-dimensional bases.
//!
//! The kernels consume two dense tables of shape `[Q1D x D1D]` (column-major): the values `B`
//! and derivatives `G` of the `D1D` basis functions at the `Q1D` quadrature abscissas. How the
//! tables are produced is up to the caller; this module provides a Lagrange tabulation on the
//! reference interval `[-1, 1]` for convenience.
use crate::error::{check_len, GradientError};
use crate::Real;
use fenris_quadrature::univariate::gauss;
use itertools::izip;
use nalgebra::convert;
use numeric_literals::replace_float_literals;

/// Owned basis value and derivative tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTables<T> {
    d1d: usize,
    q1d: usize,
    b: Vec<T>,
    g: Vec<T>,
}

/// Borrowed basis tables, as consumed by the kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisView<'a, T> {
    pub d1d: usize,
    pub q1d: usize,
    /// Basis values, `b[q + q1d * d]`.
    pub b: &'a [T],
    /// Basis derivatives, `g[q + q1d * d]`.
    pub g: &'a [T],
}

impl<'a, T: Real> BasisView<'a, T> {
    #[inline(always)]
    pub fn value(&self, q: usize, d: usize) -> T {
        self.b[q + self.q1d * d]
    }

    #[inline(always)]
    pub fn derivative(&self, q: usize, d: usize) -> T {
        self.g[q + self.q1d * d]
    }
}

impl<T: Real> BasisTables<T> {
    /// Creates basis tables from column-major `[q1d x d1d]` value and derivative tables.
    pub fn from_tables(d1d: usize, q1d: usize, b: Vec<T>, g: Vec<T>) -> Result<Self, GradientError> {
        if d1d == 0 {
            return Err(GradientError::ZeroSize { parameter: "d1d" });
        }
        if q1d == 0 {
            return Err(GradientError::ZeroSize { parameter: "q1d" });
        }
        check_len("b", d1d * q1d, b.len())?;
        check_len("g", d1d * q1d, g.len())?;
        Ok(Self { d1d, q1d, b, g })
    }

    /// Tabulates the Lagrange polynomials associated with `nodes` at the given `points`.
    ///
    /// # Panics
    ///
    /// Panics if either slice is empty. Coincident nodes produce non-finite tables.
    pub fn lagrange(nodes: &[T], points: &[T]) -> Self {
        assert!(!nodes.is_empty(), "at least one node is required");
        assert!(!points.is_empty(), "at least one point is required");
        let d1d = nodes.len();
        let q1d = points.len();
        let mut b = vec![T::zero(); d1d * q1d];
        let mut g = vec![T::zero(); d1d * q1d];

        for (i, b_i, g_i) in izip!(0..d1d, b.chunks_exact_mut(q1d), g.chunks_exact_mut(q1d)) {
            for (&x, b_iq, g_iq) in izip!(points, b_i, g_i) {
                let (value, derivative) = lagrange_value_and_derivative(nodes, i, x);
                *b_iq = value;
                *g_iq = derivative;
            }
        }

        Self { d1d, q1d, b, g }
    }

    /// Lagrange basis on `d1d` equispaced nodes, tabulated at `q1d` Gauss points.
    ///
    /// The basis reproduces polynomials of degree `d1d - 1` exactly.
    pub fn gauss_lagrange(d1d: usize, q1d: usize) -> Self {
        let nodes: Vec<T> = equispaced_nodes(d1d).into_iter().map(convert).collect();
        let points: Vec<T> = gauss_points(q1d).into_iter().map(convert).collect();
        Self::lagrange(&nodes, &points)
    }

    pub fn d1d(&self) -> usize {
        self.d1d
    }

    pub fn q1d(&self) -> usize {
        self.q1d
    }

    pub fn values(&self) -> &[T] {
        &self.b
    }

    pub fn derivatives(&self) -> &[T] {
        &self.g
    }

    pub fn view(&self) -> BasisView<'_, T> {
        BasisView {
            d1d: self.d1d,
            q1d: self.q1d,
            b: &self.b,
            g: &self.g,
        }
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn lagrange_value_and_derivative<T: Real>(nodes: &[T], i: usize, x: T) -> (T, T) {
    let x_i = nodes[i];
    let mut value = 1.0;
    let mut derivative = 0.0;
    for (k, &x_k) in nodes.iter().enumerate().filter(|(k, _)| *k != i) {
        // Product rule: differentiate factor k, keep all other factors
        let mut term = 1.0 / (x_i - x_k);
        for (_, &x_j) in nodes
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i && *j != k)
        {
            term *= (x - x_j) / (x_i - x_j);
        }
        derivative += term;
        value *= (x - x_k) / (x_i - x_k);
    }
    (value, derivative)
}

/// `n` equispaced nodes on `[-1, 1]`, including the endpoints.
///
/// A single node is placed at the midpoint.
pub fn equispaced_nodes(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// The `n` Gauss-Legendre abscissas on `[-1, 1]`, in ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss_points(n: usize) -> Vec<f64> {
    let (_, points) = gauss(n);
    let mut points: Vec<f64> = points.into_iter().map(|[x]| x).collect();
    points.sort_by(|a, b| a.total_cmp(b));
    points
}
