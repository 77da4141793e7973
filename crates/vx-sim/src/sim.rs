//! Simulation runner and result recording.

use nalgebra::DVector;

use crate::error::{SimError, SimResult};
use crate::model::DiscreteModel;

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            record_every: 1,
        }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points, in the model's time unit
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<DVector<f64>>,
    /// Outputs at the same steps
    pub y: Vec<DVector<f64>>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Drive `model` from `x0` with the input sequence `inputs`.
///
/// `inputs[n]` is the input at step `n`, so `inputs.len() - 1` steps are
/// taken. States and outputs after each recorded step are kept; the final
/// step is always recorded.
pub fn run_sim<D: DiscreteModel + ?Sized>(
    model: &D,
    x0: &DVector<f64>,
    inputs: &[DVector<f64>],
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    if inputs.len() < 2 {
        return Err(SimError::InvalidArg {
            what: "at least two input samples are required",
        });
    }
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }
    let steps = inputs.len() - 1;
    if steps > opts.max_steps {
        return Err(SimError::InvalidArg {
            what: "input sequence exceeds max_steps",
        });
    }
    if x0.len() != model.n_states() {
        return Err(SimError::vector_len("initial state", model.n_states(), x0.len()));
    }

    let dt = model.dt();
    let mut record = SimRecord::default();
    let mut x = x0.clone();
    for (n, pair) in inputs.windows(2).enumerate() {
        let (x1, y1) = model.step(&x, &pair[0], &pair[1])?;
        x = x1;
        let step = n + 1;
        if step % opts.record_every == 0 || step == steps {
            record.t.push(step as f64 * dt);
            record.x.push(x.clone());
            record.y.push(y1);
        }
    }
    tracing::debug!(steps, recorded = record.len(), "simulation done");
    Ok(record)
}

/// Outcome of [`run_to_steady`].
#[derive(Clone, Debug, PartialEq)]
pub struct SteadyRun {
    pub x: DVector<f64>,
    pub y: DVector<f64>,
    pub steps: usize,
    /// Largest output change over the last step.
    pub residual: f64,
}

/// Step under constant input `u` until successive outputs differ by less
/// than `tol` (max norm).
pub fn run_to_steady<D: DiscreteModel + ?Sized>(
    model: &D,
    x0: &DVector<f64>,
    u: &DVector<f64>,
    tol: f64,
    max_steps: usize,
) -> SimResult<SteadyRun> {
    if !(tol > 0.0) {
        return Err(SimError::InvalidArg {
            what: "tolerance must be positive",
        });
    }
    if x0.len() != model.n_states() {
        return Err(SimError::vector_len("initial state", model.n_states(), x0.len()));
    }
    let mut x = x0.clone();
    let mut y_prev: Option<DVector<f64>> = None;
    let mut residual = f64::INFINITY;
    for step in 1..=max_steps {
        let (x1, y1) = model.step(&x, u, u)?;
        x = x1;
        if let Some(prev) = &y_prev {
            residual = (&y1 - prev).amax();
            if residual < tol {
                tracing::debug!(step, residual, "steady output reached");
                return Ok(SteadyRun {
                    x,
                    y: y1,
                    steps: step,
                    residual,
                });
            }
        }
        y_prev = Some(y1);
    }
    Err(SimError::ConvergenceFailure {
        what: "time-marching to steady state".into(),
        residual,
        iterations: max_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statespace::{InputTiming, StateSpace};
    use nalgebra::DMatrix;

    fn decay() -> StateSpace {
        StateSpace::new(
            DMatrix::from_element(1, 1, 0.5),
            DMatrix::from_element(1, 1, 1.0),
            DMatrix::from_element(1, 1, 1.0),
            DMatrix::zeros(1, 1),
            0.1,
            InputTiming::Next,
        )
        .unwrap()
    }

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.max_steps, 100_000);
        assert_eq!(opts.record_every, 1);
    }

    #[test]
    fn records_are_decimated_but_keep_last_step() {
        let u = vec![DVector::from_element(1, 1.0); 8];
        let opts = SimOptions {
            record_every: 3,
            ..SimOptions::default()
        };
        let rec = run_sim(&decay(), &DVector::zeros(1), &u, &opts).unwrap();
        // steps 3, 6 and the final 7
        assert_eq!(rec.len(), 3);
        assert!((rec.t[2] - 0.7).abs() < 1e-12);
        assert_eq!(rec.x[0][0], 1.75);
    }

    #[test]
    fn invalid_runs_are_rejected() {
        let m = decay();
        let u = vec![DVector::from_element(1, 1.0); 2];
        assert!(run_sim(&m, &DVector::zeros(1), &u[..1], &SimOptions::default()).is_err());
        assert!(run_sim(&m, &DVector::zeros(2), &u, &SimOptions::default()).is_err());
        let opts = SimOptions {
            record_every: 0,
            ..SimOptions::default()
        };
        assert!(run_sim(&m, &DVector::zeros(1), &u, &opts).is_err());
    }

    #[test]
    fn marching_reaches_fixed_point() {
        let run = run_to_steady(&decay(), &DVector::zeros(1), &DVector::from_element(1, 1.0), 1e-10, 100)
            .unwrap();
        assert!((run.y[0] - 2.0).abs() < 1e-9);
        let err = run_to_steady(&decay(), &DVector::zeros(1), &DVector::from_element(1, 1.0), 1e-10, 5)
            .unwrap_err();
        assert!(matches!(err, SimError::ConvergenceFailure { iterations: 5, .. }));
    }
}
