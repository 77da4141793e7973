//! Discrete-time state-space container.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use vx_core::MatrixLike;

use crate::error::{SimError, SimResult};
use crate::freq::{FrequencyResponse, complexify};
use crate::model::DiscreteModel;

/// Which input sample drives the state update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputTiming {
    /// `x[n+1] = A x[n] + B u[n+1]`
    Next,
    /// `x[n+1] = A x[n] + B u[n]`
    Current,
}

/// `(A, B, C, D, dt)` with A and B in storage `M`, C and D dense.
///
/// The output always uses the input at the new step:
/// `y[n+1] = C x[n+1] + D u[n+1]`.
#[derive(Clone, Debug)]
pub struct StateSpace<M: MatrixLike = DMatrix<f64>> {
    pub a: M,
    pub b: M,
    pub c: DMatrix<f64>,
    pub d: DMatrix<f64>,
    pub dt: f64,
    pub timing: InputTiming,
}

impl<M: MatrixLike> StateSpace<M> {
    pub fn new(
        a: M,
        b: M,
        c: DMatrix<f64>,
        d: DMatrix<f64>,
        dt: f64,
        timing: InputTiming,
    ) -> SimResult<Self> {
        let ss = Self {
            a,
            b,
            c,
            d,
            dt,
            timing,
        };
        ss.validate()?;
        Ok(ss)
    }

    /// Check that all blocks agree on `N`, `Nu` and `Ny` and `dt > 0`.
    pub fn validate(&self) -> SimResult<()> {
        let n = self.a.nrows();
        let nu = self.b.ncols();
        let ny = self.c.nrows();
        let checks = [
            ("A", (n, n), self.a.shape()),
            ("B", (n, nu), self.b.shape()),
            ("C", (ny, n), self.c.shape()),
            ("D", (ny, nu), self.d.shape()),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(SimError::Dimension {
                    what: what.to_string(),
                    expected,
                    actual,
                });
            }
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        Ok(())
    }

    pub fn n_states(&self) -> usize {
        self.a.nrows()
    }

    pub fn n_inputs(&self) -> usize {
        self.b.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.c.nrows()
    }

    pub fn to_dense(&self) -> StateSpace<DMatrix<f64>> {
        StateSpace {
            a: self.a.to_dense(),
            b: self.b.to_dense(),
            c: self.c.clone(),
            d: self.d.clone(),
            dt: self.dt,
            timing: self.timing,
        }
    }

    pub(crate) fn check_step_args(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        u_next: &DVector<f64>,
    ) -> SimResult<()> {
        if x.len() != self.n_states() {
            return Err(SimError::vector_len("state", self.n_states(), x.len()));
        }
        for v in [u, u_next] {
            if v.len() != self.n_inputs() {
                return Err(SimError::vector_len("input", self.n_inputs(), v.len()));
            }
        }
        Ok(())
    }

    /// Reference frequency response from the full resolvent,
    /// `C (zI - A)^-1 z B + D` or `C (zI - A)^-1 B + D` by input timing.
    ///
    /// Costs one dense N x N complex factorization per frequency.
    pub fn freqresp(&self, frequencies: &[f64]) -> SimResult<FrequencyResponse> {
        let n = self.n_states();
        let a = complexify(&self.a.to_dense());
        let b = complexify(&self.b.to_dense());
        let c = complexify(&self.c);
        let d = complexify(&self.d);
        let mut data = Vec::with_capacity(frequencies.len());
        for &w in frequencies {
            let z = Complex64::from_polar(1.0, w * self.dt);
            let lhs = DMatrix::<Complex64>::identity(n, n) * z - &a;
            let rhs = match self.timing {
                InputTiming::Next => &b * z,
                InputTiming::Current => b.clone(),
            };
            let x = lhs
                .lu()
                .solve(&rhs)
                .ok_or_else(|| SimError::singular(format!("resolvent at w = {w}")))?;
            data.push(&c * x + &d);
        }
        Ok(FrequencyResponse {
            frequencies: frequencies.to_vec(),
            data,
        })
    }
}

impl<M: MatrixLike> DiscreteModel for StateSpace<M> {
    fn n_states(&self) -> usize {
        StateSpace::n_states(self)
    }

    fn n_inputs(&self) -> usize {
        StateSpace::n_inputs(self)
    }

    fn n_outputs(&self) -> usize {
        StateSpace::n_outputs(self)
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn step(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        u_next: &DVector<f64>,
    ) -> SimResult<(DVector<f64>, DVector<f64>)> {
        self.check_step_args(x, u, u_next)?;
        let drive = match self.timing {
            InputTiming::Next => u_next,
            InputTiming::Current => u,
        };
        let x1 = self.a.mul_vec(x) + self.b.mul_vec(drive);
        let y1 = &self.c * &x1 + &self.d * u_next;
        Ok((x1, y1))
    }
}
