//! vx-core: stable foundation for vortexss.
//!
//! Contains:
//! - error (shared error types)
//! - numeric (Real + positivity checks + matrix difference helpers)
//! - ids (compact surface identifiers)
//! - units (uom SI types + constructors for reference quantities)
//! - timing (assembly/scaling timers)
//! - matrix (dense/sparse `MatrixLike` capability used by the assemblers)

pub mod error;
pub mod ids;
pub mod matrix;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{VxError, VxResult};
pub use ids::*;
pub use matrix::{MatrixLike, SparseMatrix};
pub use numeric::*;
pub use units::*;
