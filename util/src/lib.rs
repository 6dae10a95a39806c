/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Approximate entry-wise comparison of two flat buffers of `f64`.
///
/// On failure, the first offending index is reported together with both values.
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let x: &[f64] = &$x[..];
        let y: &[f64] = &$y[..];
        assert_eq!(x.len(), y.len(), "buffers have different lengths");
        if let Some(idx) = $crate::first_mismatch(x, y, $tol) {
            panic!(
                "buffers differ at index {}: left = {:e}, right = {:e}, abstol = {:e}",
                idx, x[idx], y[idx], $tol
            );
        }
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Returns the first index at which the two buffers differ by more than `tol`.
///
/// NaN entries always count as a mismatch.
pub fn first_mismatch(x: &[f64], y: &[f64], tol: f64) -> Option<usize> {
    x.iter()
        .zip(y)
        .position(|(a, b)| !((a - b).abs() <= tol))
}

/// Multi-indices of a regular grid with `n^dim` points, first index varying fastest.
pub fn grid_points(n: usize, dim: usize) -> Vec<Vec<usize>> {
    let total = n.pow(dim as u32);
    (0..total)
        .map(|mut linear| {
            let mut multi = Vec::with_capacity(dim);
            for _ in 0..dim {
                multi.push(linear % n);
                linear /= n;
            }
            multi
        })
        .collect()
}
