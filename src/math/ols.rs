//! Dense least squares helpers.
//!
//! The nonlinear solver reduces every damped step to a small linear problem:
//!
//! ```text
//! minimize ‖A δ - b‖²
//! ```
//!
//! where `A` stacks the Jacobian on top of the damping rows. Sizes are tiny
//! (a handful of samples, two parameters), so we always go through SVD: it
//! handles tall matrices and exposes the singular values for rank checks.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoff used by [`numerical_rank`] callers.
pub const RANK_RTOL: f64 = 1e-12;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve or the
/// solution is not finite.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() != b.len() || a.ncols() == 0 {
        return None;
    }
    let svd = a.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }

    let x = svd.solve(b, s_max * RANK_RTOL).ok()?;
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Number of singular values above `rtol * σ_max`.
///
/// A zero matrix has rank 0.
pub fn numerical_rank(m: &DMatrix<f64>, rtol: f64) -> usize {
    if m.is_empty() {
        return 0;
    }
    let s = m.clone().singular_values();
    let s_max = s.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return 0;
    }
    s.iter().filter(|&&v| v > s_max * rtol).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let x = solve_least_squares(&a, &b).unwrap();
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn zero_matrix_has_no_solution() {
        let a = DMatrix::<f64>::zeros(3, 2);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&a, &b).is_none());
    }

    #[test]
    fn rank_detects_collinear_columns() {
        let full = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        assert_eq!(numerical_rank(&full, RANK_RTOL), 2);

        let collinear = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert_eq!(numerical_rank(&collinear, RANK_RTOL), 1);

        assert_eq!(numerical_rank(&DMatrix::zeros(3, 2), RANK_RTOL), 0);
    }
}
