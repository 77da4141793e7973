//! Error types for steady assembly and solves.

use thiserror::Error;
use vx_lattice::LatticeError;

/// Errors raised while assembling or solving the steady system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Numerical singularity in {solve}")]
    NumericalSingularity { solve: String },

    #[error("Convergence failure in {what} after {iterations} iterations (residual = {residual:e})")]
    ConvergenceFailure {
        what: String,
        residual: f64,
        iterations: usize,
    },

    #[error("Dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    Dimension {
        what: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),
}

pub type SolverResult<T> = Result<T, SolverError>;
