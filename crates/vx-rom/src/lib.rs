//! Model reduction for linearised lattice models.
//!
//! Frequency-limited balanced truncation: Gramians are integrated over a
//! low and a high frequency band, the low band weighting observability only.

pub mod balanced;
pub mod balfreq;
pub mod band;
pub mod error;

pub use balanced::{BalancedModel, ReducedModel};
pub use balfreq::balfreq;
pub use band::{BalancingSettings, FrequencyBand, nyquist};
pub use error::{RomError, RomResult};
