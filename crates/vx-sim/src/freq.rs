//! Fast frequency response.
//!
//! The wake only delays the trailing-edge circulation, so at `z = exp(i w dt)`
//! its state is `Cw(z) Gamma`. Eliminating it (and the derivative and lag
//! states, which are multiples of `Gamma`) leaves one K x K complex solve per
//! frequency instead of an N x N one.

use nalgebra::{DMatrix, Dyn, LU};
use num_complex::Complex64;
use vx_lattice::{WakeAtFrequency, WakeKernel};

use crate::error::{SimError, SimResult};
use crate::settings::IntegrationOrder;

pub(crate) fn complexify(m: &DMatrix<f64>) -> DMatrix<Complex64> {
    m.map(|v| Complex64::new(v, 0.0))
}

/// Largest entry modulus `max |m_ij|`.
pub fn max_modulus(m: &DMatrix<Complex64>) -> f64 {
    m.iter().map(|v| v.norm()).fold(0.0, f64::max)
}

/// Transfer function sampled at a list of angular frequencies.
///
/// `data[k]` is the `outputs x inputs` matrix at `frequencies[k]`.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyResponse {
    pub frequencies: Vec<f64>,
    pub data: Vec<DMatrix<Complex64>>,
}

impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&DMatrix<Complex64>> {
        self.data.get(index)
    }

    pub fn n_outputs(&self) -> usize {
        self.data.first().map_or(0, |m| m.nrows())
    }

    pub fn n_inputs(&self) -> usize {
        self.data.first().map_or(0, |m| m.ncols())
    }

    /// One input/output pair across all frequencies.
    pub fn entry(&self, output: usize, input: usize) -> Vec<Complex64> {
        self.data.iter().map(|m| m[(output, input)]).collect()
    }

    /// Largest entry modulus over all frequencies.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(max_modulus).fold(0.0, f64::max)
    }

    /// Largest entry-wise difference modulus. Responses must share shape.
    pub fn max_abs_diff(&self, other: &FrequencyResponse) -> SimResult<f64> {
        if self.len() != other.len() {
            return Err(SimError::vector_len("frequency response", self.len(), other.len()));
        }
        let mut out: f64 = 0.0;
        for (a, b) in self.data.iter().zip(&other.data) {
            if a.shape() != b.shape() {
                return Err(SimError::Dimension {
                    what: "frequency response".into(),
                    expected: a.shape(),
                    actual: b.shape(),
                });
            }
            out = out.max(max_modulus(&(a - b)));
        }
        Ok(out)
    }
}

/// How bound circulation is tied to the input at one frequency.
#[derive(Clone, Debug)]
pub enum CirculationKernel<'a> {
    /// `(z I - P - Pw Cw) Gamma = z Bup u`, from a discrete-time model.
    Propagator { p: DMatrix<f64>, pw: DMatrix<f64> },
    /// `(A0 + A0W Cw) Gamma = B u`, straight from the influence matrices.
    Influence {
        aic: &'a DMatrix<f64>,
        aic_wake: &'a DMatrix<f64>,
    },
}

/// A model written over bound circulation only.
///
/// The output is `y = Cg Gamma + C* Gamma_w + Cd delta + Cl Gamma(n-1) + D u`.
#[derive(Clone, Debug)]
pub struct CirculationSystem<'a> {
    pub order: IntegrationOrder,
    pub dt: f64,
    pub wake: &'a WakeKernel,
    pub kernel: CirculationKernel<'a>,
    /// Input coupling of bound circulation (K x Nu).
    pub b_bound: DMatrix<f64>,
    pub c_gamma: DMatrix<f64>,
    pub c_star: DMatrix<f64>,
    pub c_delta: DMatrix<f64>,
    pub c_lag: Option<DMatrix<f64>>,
    pub d: DMatrix<f64>,
}

/// Factorized kernel at one frequency.
pub struct FrequencyPoint {
    pub w: f64,
    pub z: Complex64,
    pub cw: WakeAtFrequency,
    matrix: DMatrix<Complex64>,
    lu: LU<Complex64, Dyn, Dyn>,
}

impl FrequencyPoint {
    /// `matrix^-1 rhs`
    pub fn solve(&self, rhs: &DMatrix<Complex64>) -> SimResult<DMatrix<Complex64>> {
        self.lu
            .solve(rhs)
            .ok_or_else(|| SimError::singular(format!("frequency kernel at w = {}", self.w)))
    }

    /// `matrix^-H rhs`
    pub fn solve_adjoint(&self, rhs: &DMatrix<Complex64>) -> SimResult<DMatrix<Complex64>> {
        self.matrix
            .adjoint()
            .lu()
            .solve(rhs)
            .ok_or_else(|| SimError::singular(format!("adjoint frequency kernel at w = {}", self.w)))
    }

    pub fn matrix(&self) -> &DMatrix<Complex64> {
        &self.matrix
    }
}

impl<'a> CirculationSystem<'a> {
    pub fn k(&self) -> usize {
        self.b_bound.nrows()
    }

    pub fn n_inputs(&self) -> usize {
        self.b_bound.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.d.nrows()
    }

    /// Build and factorize the kernel at angular frequency `w`.
    pub fn at(&self, w: f64) -> SimResult<FrequencyPoint> {
        let z = Complex64::from_polar(1.0, w * self.dt);
        let cw = self.wake.at_frequency(z);
        let matrix = match &self.kernel {
            CirculationKernel::Propagator { p, pw } => {
                let k = p.nrows();
                DMatrix::<Complex64>::identity(k, k) * z - complexify(p) - cw.premul_real(pw)
            }
            CirculationKernel::Influence { aic, aic_wake } => {
                complexify(aic) + cw.premul_real(aic_wake)
            }
        };
        let lu = matrix.clone().lu();
        if !lu.is_invertible() {
            return Err(SimError::singular(format!("frequency kernel at w = {w}")));
        }
        Ok(FrequencyPoint {
            w,
            z,
            cw,
            matrix,
            lu,
        })
    }

    /// Bound-circulation response to each input (K x Nu).
    pub fn circulation_response(&self, point: &FrequencyPoint) -> SimResult<DMatrix<Complex64>> {
        let rhs = complexify(&self.b_bound);
        match self.kernel {
            CirculationKernel::Propagator { .. } => point.solve(&(rhs * point.z)),
            CirculationKernel::Influence { .. } => point.solve(&rhs),
        }
    }

    /// Derivative-state factor at this point.
    pub fn derivative_factor(&self, point: &FrequencyPoint) -> Complex64 {
        self.order.derivative_factor(point.z, point.w * self.dt)
    }

    /// Transfer function at angular frequency `w`.
    pub fn response(&self, w: f64) -> SimResult<DMatrix<Complex64>> {
        let point = self.at(w)?;
        let xg = self.circulation_response(&point)?;
        let xw = point.cw.apply(&xg);
        let mut y = complexify(&self.c_gamma) * &xg + complexify(&self.c_star) * xw;
        y += complexify(&self.c_delta) * &xg * self.derivative_factor(&point);
        if let Some(c_lag) = &self.c_lag {
            y += complexify(c_lag) * &xg * point.z.inv();
        }
        y += complexify(&self.d);
        Ok(y)
    }

    /// Transfer function over a frequency list.
    pub fn freqresp(&self, frequencies: &[f64]) -> SimResult<FrequencyResponse> {
        let data = frequencies
            .iter()
            .map(|&w| self.response(w))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(FrequencyResponse {
            frequencies: frequencies.to_vec(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(values: &[f64]) -> FrequencyResponse {
        FrequencyResponse {
            frequencies: (0..values.len()).map(|i| i as f64).collect(),
            data: values
                .iter()
                .map(|&v| DMatrix::from_element(2, 3, Complex64::new(v, -v)))
                .collect(),
        }
    }

    #[test]
    fn accessors() {
        let r = response(&[1.0, 2.0]);
        assert_eq!(r.len(), 2);
        assert_eq!((r.n_outputs(), r.n_inputs()), (2, 3));
        assert_eq!(r.entry(1, 2)[1], Complex64::new(2.0, -2.0));
        assert!((r.max_abs() - 2.0_f64.sqrt() * 2.0).abs() < 1e-14);
    }

    #[test]
    fn diff_requires_matching_grids() {
        let a = response(&[1.0, 2.0]);
        let b = response(&[1.0, 2.5]);
        let d = a.max_abs_diff(&b).unwrap();
        assert!((d - 0.5 * 2.0_f64.sqrt()).abs() < 1e-14);
        assert!(a.max_abs_diff(&response(&[1.0])).is_err());
    }

    #[test]
    fn modulus_is_euclidean() {
        let r = FrequencyResponse {
            frequencies: vec![0.0],
            data: vec![DMatrix::from_element(1, 1, Complex64::new(3.0, 4.0))],
        };
        assert!((r.max_abs() - 5.0).abs() < 1e-14);
        let zero = FrequencyResponse {
            frequencies: vec![0.0],
            data: vec![DMatrix::zeros(1, 1)],
        };
        assert!((r.max_abs_diff(&zero).unwrap() - 5.0).abs() < 1e-14);
    }
}
