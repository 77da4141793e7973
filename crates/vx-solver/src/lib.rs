//! Steady linear vortex-lattice solver.
//!
//! Assembles the steady influence system around a reference lattice, folds
//! the wake into the bound system and solves for bound circulation and
//! vertex forces. Gain matrices map the force field onto total force and
//! moment, sectional loads and rigid-body motion.

pub mod assembly;
pub mod error;
pub mod gains;
pub mod linalg;
pub mod steady;

pub use assembly::SteadyAssembly;
pub use error::{SolverError, SolverResult};
pub use gains::{ForceGains, RigidMotionGains, SectionalGains};
pub use linalg::{factorize, lu_solve, lu_solve_vec};
pub use steady::{SteadyInput, SteadySolution, SurfaceSolution};
