//! Dense factorization helpers shared by the model builders.

use nalgebra::{DMatrix, DVector, Dyn, LU};

use crate::error::{SolverError, SolverResult};

/// Pivot ratio below which a factorization is treated as singular.
const SINGULAR_PIVOT_RATIO: f64 = 1e-13;

/// LU-factorize `matrix`, failing with `NumericalSingularity` when a pivot
/// vanishes relative to the largest one. `solve` names the failing system.
pub fn factorize(matrix: DMatrix<f64>, solve: &str) -> SolverResult<LU<f64, Dyn, Dyn>> {
    let singular = || SolverError::NumericalSingularity {
        solve: solve.to_string(),
    };
    if matrix.is_empty() || !matrix.is_square() || matrix.iter().any(|v| !v.is_finite()) {
        return Err(singular());
    }
    let lu = matrix.lu();
    let u = lu.u();
    let pivots = u.diagonal().map(f64::abs);
    let max = pivots.max();
    if max == 0.0 || pivots.min() < SINGULAR_PIVOT_RATIO * max {
        return Err(singular());
    }
    Ok(lu)
}

/// Solve with a factorization, checking the result is finite.
pub fn lu_solve(
    lu: &LU<f64, Dyn, Dyn>,
    rhs: &DMatrix<f64>,
    solve: &str,
) -> SolverResult<DMatrix<f64>> {
    lu.solve(rhs)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or_else(|| SolverError::NumericalSingularity {
            solve: solve.to_string(),
        })
}

/// Vector right-hand side variant of [`lu_solve`].
pub fn lu_solve_vec(
    lu: &LU<f64, Dyn, Dyn>,
    rhs: &DVector<f64>,
    solve: &str,
) -> SolverResult<DVector<f64>> {
    lu.solve(rhs)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or_else(|| SolverError::NumericalSingularity {
            solve: solve.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_well_conditioned_system() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let lu = factorize(a.clone(), "test").unwrap();
        let b = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let x = lu_solve(&lu, &b, "test").unwrap();
        assert!((&a * x - b).amax() < 1e-14);
    }

    #[test]
    fn rank_deficient_matrix_is_singular() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let err = factorize(a, "steady AIC").unwrap_err();
        assert_eq!(
            err,
            SolverError::NumericalSingularity {
                solve: "steady AIC".into()
            }
        );
    }

    #[test]
    fn empty_or_rectangular_is_rejected() {
        assert!(factorize(DMatrix::zeros(0, 0), "empty").is_err());
        assert!(factorize(DMatrix::zeros(2, 3), "rect").is_err());
    }
}
