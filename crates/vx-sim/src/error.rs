//! Error types for model assembly, stepping and frequency response.

use thiserror::Error;
use vx_core::VxError;
use vx_solver::SolverError;

/// Errors raised by the dynamic and frequency-domain models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
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

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Configuration { what: what.into() }
    }

    pub(crate) fn singular(solve: impl Into<String>) -> Self {
        SimError::NumericalSingularity {
            solve: solve.into(),
        }
    }

    pub(crate) fn vector_len(what: &str, expected: usize, actual: usize) -> Self {
        SimError::Dimension {
            what: what.to_string(),
            expected: (expected, 1),
            actual: (actual, 1),
        }
    }
}

impl From<SolverError> for SimError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Configuration { what } => SimError::Configuration { what },
            SolverError::NumericalSingularity { solve } => SimError::NumericalSingularity { solve },
            SolverError::ConvergenceFailure {
                what,
                residual,
                iterations,
            } => SimError::ConvergenceFailure {
                what,
                residual,
                iterations,
            },
            SolverError::Dimension {
                what,
                expected,
                actual,
            } => SimError::Dimension {
                what,
                expected,
                actual,
            },
            SolverError::Lattice(e) => SimError::Backend {
                message: e.to_string(),
            },
        }
    }
}

impl From<VxError> for SimError {
    fn from(e: VxError) -> Self {
        SimError::Configuration {
            what: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_errors_keep_their_kind() {
        let e: SimError = SolverError::NumericalSingularity {
            solve: "bound influence matrix".into(),
        }
        .into();
        assert_eq!(e, SimError::singular("bound influence matrix"));

        let e: SimError = SolverError::Configuration {
            what: "order".into(),
        }
        .into();
        assert!(matches!(e, SimError::Configuration { .. }));
    }
}
