use crate::{VxError, VxResult};
use nalgebra::{Dim, Matrix, storage::Storage};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> VxResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(VxError::NonFinite { what, value: v })
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> VxResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(VxError::NonPositive { what, value: v })
    }
}

/// Largest absolute entry-wise difference between two equally sized matrices.
///
/// Returns `f64::INFINITY` when the shapes differ.
pub fn max_abs_diff<R1, C1, S1, R2, C2, S2>(
    a: &Matrix<Real, R1, C1, S1>,
    b: &Matrix<Real, R2, C2, S2>,
) -> Real
where
    R1: Dim,
    C1: Dim,
    S1: Storage<Real, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: Storage<Real, R2, C2>,
{
    if a.shape() != b.shape() {
        return Real::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, Real::max)
}

/// `max|a - b| / max(max|b|, floor)`.
pub fn relative_diff<R1, C1, S1, R2, C2, S2>(
    a: &Matrix<Real, R1, C1, S1>,
    b: &Matrix<Real, R2, C2, S2>,
    floor: Real,
) -> Real
where
    R1: Dim,
    C1: Dim,
    S1: Storage<Real, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: Storage<Real, R2, C2>,
{
    let scale = b.iter().fold(0.0, |m: Real, v| m.max(v.abs())).max(floor);
    max_abs_diff(a, b) / scale
}
