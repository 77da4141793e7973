//! Steady state of the discrete-time model under a constant input.
//!
//! These solves are cross-checks against [`vx_solver::SteadyAssembly::solve`];
//! `Direct` is the canonical one.

use nalgebra::{DMatrix, DVector, Vector3};
use vx_core::MatrixLike;
use vx_solver::{factorize, lu_solve_vec};

use crate::dynamic::DynamicModel;
use crate::error::{SimError, SimResult};

/// Iteration cap for [`SteadyMethod::Recursive`].
pub const RECURSIVE_MAX_ITERATIONS: usize = 1000;
/// Relative step change of both the state and the total force below which
/// the recursion stops.
pub const RECURSIVE_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SteadyMethod {
    /// `(I - A) x = B u` over the full state.
    Direct,
    /// K x K system over bound circulation with the wake replicated.
    MinSize,
    /// Step the model until the state and the total force stop changing.
    Recursive,
    /// `(I - A) x = B u` over bound and wake circulation only.
    Subsystem,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SteadyState {
    /// State in the model's own representation.
    pub x: DVector<f64>,
    pub y: DVector<f64>,
}

impl<M: MatrixLike> DynamicModel<'_, M> {
    /// Steady state under constant input `u`.
    ///
    /// Only `Direct` is available once the predictor has been removed; its
    /// state is then the transformed one.
    pub fn solve_steady(&self, u: &DVector<f64>, method: SteadyMethod) -> SimResult<SteadyState> {
        let ss = self.state_space();
        if u.len() != ss.n_inputs() {
            return Err(SimError::vector_len("input", ss.n_inputs(), u.len()));
        }
        if self.is_predictor_removed() && method != SteadyMethod::Direct {
            return Err(SimError::config(format!(
                "steady method {method:?} needs the predictor term; only Direct is available"
            )));
        }

        let x = match method {
            SteadyMethod::Direct => {
                let n = ss.n_states();
                let lhs = DMatrix::identity(n, n) - ss.a.to_dense();
                let lu = factorize(lhs, "steady state-space system")?;
                lu_solve_vec(&lu, &ss.b.mul_vec(u), "steady state-space system")?
            }
            SteadyMethod::MinSize => self.steady_min_size(u)?,
            SteadyMethod::Recursive => return self.steady_recursive(u),
            SteadyMethod::Subsystem => {
                let (k, k_star) = (self.steady().k(), self.steady().k_star());
                let n_sub = k + k_star;
                let lhs = DMatrix::identity(n_sub, n_sub) - ss.a.block(0..n_sub, 0..n_sub);
                let rhs = ss.b.block(0..n_sub, 0..ss.n_inputs()) * u;
                let lu = factorize(lhs, "steady circulation subsystem")?;
                let sub = lu_solve_vec(&lu, &rhs, "steady circulation subsystem")?;
                let gamma = sub.rows(0, k).into_owned();
                self.full_state(&gamma, &sub.rows(k, k_star).into_owned())
            }
        };
        let y = &ss.c * &x + &ss.d * u;
        Ok(SteadyState { x, y })
    }

    fn steady_min_size(&self, u: &DVector<f64>) -> SimResult<DVector<f64>> {
        let ss = self.state_space();
        let steady = self.steady();
        let (k, k_star) = (steady.k(), steady.k_star());
        let p = ss.a.block(0..k, 0..k);
        let pw = ss.a.block(0..k, k..k + k_star);
        let e: DMatrix<f64> = steady.wake.steady_replication();
        let lhs = DMatrix::identity(k, k) - p - pw * e;
        let rhs = ss.b.block(0..k, 0..ss.n_inputs()) * u;
        let lu = factorize(lhs, "steady bound circulation system")?;
        let gamma = lu_solve_vec(&lu, &rhs, "steady bound circulation system")?;
        let gamma_star = steady.wake.replicate(&gamma);
        Ok(self.full_state(&gamma, &gamma_star))
    }

    fn steady_recursive(&self, u: &DVector<f64>) -> SimResult<SteadyState> {
        let ss = self.state_space();
        let mut x: DVector<f64> = DVector::zeros(ss.n_states());
        let mut f_prev = Vector3::zeros();
        let mut residual = f64::INFINITY;
        for iteration in 1..=RECURSIVE_MAX_ITERATIONS {
            let x_next = ss.a.mul_vec(&x) + ss.b.mul_vec(u);
            let y = &ss.c * &x_next + &ss.d * u;
            let (f_tot, _) = self.steady().total_forces(&y, Vector3::zeros());
            let force_residual = (f_tot - f_prev).norm() / f_tot.norm().max(1.0);
            let state_residual = (&x_next - &x).amax() / x_next.amax().max(1.0);
            residual = force_residual.max(state_residual);
            x = x_next;
            f_prev = f_tot;
            if residual <= RECURSIVE_TOLERANCE {
                tracing::debug!(iteration, residual, "recursive steady state converged");
                return Ok(SteadyState { x, y });
            }
        }
        Err(SimError::ConvergenceFailure {
            what: "recursive steady state".into(),
            residual,
            iterations: RECURSIVE_MAX_ITERATIONS,
        })
    }

    /// Steady full state: zero derivative, lagged circulation equal to current.
    fn full_state(&self, gamma: &DVector<f64>, gamma_star: &DVector<f64>) -> DVector<f64> {
        let (k, k_star) = (gamma.len(), gamma_star.len());
        let mut x = DVector::zeros(self.state_space().n_states());
        x.rows_mut(0, k).copy_from(gamma);
        x.rows_mut(k, k_star).copy_from(gamma_star);
        if self.order().has_lag() {
            x.rows_mut(2 * k + k_star, k).copy_from(gamma);
        }
        x
    }
}
