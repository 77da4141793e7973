//! Balanced realisations and their truncation.

use nalgebra::{DMatrix, DVector};
use vx_sim::{FrequencyResponse, StateSpace};

use crate::error::{RomError, RomResult};

/// Full balanced realisation with its Hankel-like singular values.
///
/// `x = T xb` and `xb = Ti x`, with `Ti T = I` on the balanced subspace.
#[derive(Clone, Debug)]
pub struct BalancedModel {
    pub ss: StateSpace,
    pub t: DMatrix<f64>,
    pub ti: DMatrix<f64>,
    /// Descending.
    pub gv: DVector<f64>,
}

/// Leading states of a [`BalancedModel`].
#[derive(Clone, Debug)]
pub struct ReducedModel {
    pub ss: StateSpace,
    pub t: DMatrix<f64>,
    pub ti: DMatrix<f64>,
    pub gv: DVector<f64>,
}

impl BalancedModel {
    pub fn order(&self) -> usize {
        self.gv.len()
    }

    /// Keep the first `order` balanced states.
    pub fn truncate(&self, order: usize) -> RomResult<ReducedModel> {
        if order == 0 || order > self.order() {
            return Err(RomError::config(format!(
                "truncation order {order} outside 1..={}",
                self.order()
            )));
        }
        let ss = StateSpace::new(
            self.ss.a.view((0, 0), (order, order)).into_owned(),
            self.ss.b.rows(0, order).into_owned(),
            self.ss.c.columns(0, order).into_owned(),
            self.ss.d.clone(),
            self.ss.dt,
            self.ss.timing,
        )?;
        tracing::debug!(
            from = self.order(),
            to = order,
            discarded = self.discarded(order),
            "balanced truncation"
        );
        Ok(ReducedModel {
            ss,
            t: self.t.columns(0, order).into_owned(),
            ti: self.ti.rows(0, order).into_owned(),
            gv: self.gv.rows(0, order).into_owned(),
        })
    }

    /// Keep the states whose singular value exceeds `tol` times the largest.
    pub fn truncate_to(&self, tol: f64) -> RomResult<ReducedModel> {
        if !(tol > 0.0 && tol < 1.0) {
            return Err(RomError::config("relative truncation tolerance must lie in (0, 1)"));
        }
        let floor = tol * self.gv.get(0).copied().unwrap_or(0.0);
        let order = self.gv.iter().take_while(|&&g| g > floor).count();
        self.truncate(order)
    }

    /// Sum of the singular values dropped by truncating to `order`.
    pub fn discarded(&self, order: usize) -> f64 {
        self.gv.iter().skip(order).sum()
    }
}

impl ReducedModel {
    pub fn order(&self) -> usize {
        self.gv.len()
    }

    pub fn freqresp(&self, frequencies: &[f64]) -> RomResult<FrequencyResponse> {
        Ok(self.ss.freqresp(frequencies)?)
    }
}
