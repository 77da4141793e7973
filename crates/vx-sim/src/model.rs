//! DiscreteModel trait for steppable linear systems.

use nalgebra::DVector;

use crate::error::SimResult;

/// A discrete-time system that can be advanced one step at a time.
///
/// States passed in and returned are always in the physical representation,
/// so full-order, predictor-removed and reduced models can share a runner.
pub trait DiscreteModel {
    fn n_states(&self) -> usize;
    fn n_inputs(&self) -> usize;
    fn n_outputs(&self) -> usize;

    /// Time step (dimensional or not, as the model currently is).
    fn dt(&self) -> f64;

    /// Advance from `x` with input `u` at the current step and `u_next` at
    /// the new one. Returns the new state and output.
    fn step(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        u_next: &DVector<f64>,
    ) -> SimResult<(DVector<f64>, DVector<f64>)>;
}
