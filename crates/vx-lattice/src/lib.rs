//! vx-lattice: lattice snapshot and influence-coefficient boundary for vortexss.
//!
//! Provides:
//! - Surface grids (bound + wake vertices, velocities, reference state)
//! - Lattice builder with validation
//! - Size record and vertex/panel indexing
//! - Wake propagation kernel and its frequency image
//! - `InfluenceProvider` trait and a deterministic surrogate provider
//!
//! # Example
//!
//! ```
//! use nalgebra::Vector3;
//! use vx_lattice::{LatticeBuilder, SurfaceGrid};
//!
//! let wing = SurfaceGrid::rectangular("wing", 4, 2, 10, 1.0, 4.0, Vector3::new(10.0, 0.0, 0.0));
//! let mut builder = LatticeBuilder::new(1.225);
//! builder.add_surface(wing);
//! let lattice = builder.build().unwrap();
//!
//! let sizes = lattice.sizes();
//! assert_eq!(sizes.k, 8);
//! assert_eq!(sizes.k_star, 20);
//! assert_eq!(sizes.kzeta, 15);
//! ```

pub mod builder;
pub mod error;
pub mod indexing;
pub mod influence;
pub mod lattice;
pub mod surface;
pub mod surrogate;
pub(crate) mod validate;
pub mod wake;

// Re-exports for ergonomics
pub use builder::LatticeBuilder;
pub use error::{LatticeError, LatticeResult};
pub use indexing::{SizeRecord, SurfaceSizes};
pub use influence::InfluenceProvider;
pub use lattice::Lattice;
pub use surface::SurfaceGrid;
pub use surrogate::SurrogateInfluence;
pub use wake::{WakeAtFrequency, WakeKernel};
