//! Error types for model reduction.

use thiserror::Error;
use vx_sim::SimError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RomError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Numerical singularity in {solve}")]
    NumericalSingularity { solve: String },

    #[error("Model error: {0}")]
    Model(#[from] SimError),
}

pub type RomResult<T> = Result<T, RomError>;

impl RomError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        RomError::Configuration { what: what.into() }
    }
}
