//! vx-sim: discrete-time linear UVLM models.
//!
//! - `DynamicModel`: state-space assembly over bound circulation, wake
//!   circulation, circulation rate and (second order) lagged circulation,
//!   with optional predictor removal, scaling and stepping
//! - `FrequencyModel`: frequency-domain model on the influence matrices
//! - fast frequency response through a K x K solve per frequency
//! - `run_sim` / `run_to_steady` over any [`DiscreteModel`]

pub mod dynamic;
pub mod error;
pub mod freq;
pub mod frequency;
pub mod model;
pub mod settings;
pub mod sim;
pub mod statespace;
pub mod steady_state;
pub mod variables;

pub use dynamic::{DynamicModel, UnpackedState, state_count};
pub use error::{SimError, SimResult};
pub use freq::{
    CirculationKernel, CirculationSystem, FrequencyPoint, FrequencyResponse, max_modulus,
};
pub use frequency::{FrequencyModel, GainSide};
pub use model::DiscreteModel;
pub use settings::{
    DifferenceCoefficients, DynamicSettings, FrequencySettings, IntegrationOrder, ScalingFactors,
    ScalingReference,
};
pub use sim::{SimOptions, SimRecord, SteadyRun, run_sim, run_to_steady};
pub use statespace::{InputTiming, StateSpace};
pub use steady_state::{SteadyMethod, SteadyState};
pub use variables::VariableMap;
