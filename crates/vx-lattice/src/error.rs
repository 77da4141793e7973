//! Lattice-specific error types.

use vx_core::SurfaceId;

pub type LatticeResult<T> = Result<T, LatticeError>;

/// Lattice construction, validation and provider errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeError {
    /// The lattice has no surfaces.
    EmptyLattice,

    /// A surface has an invalid panel count.
    InvalidDims {
        surface: String,
        what: &'static str,
    },

    /// A stored array does not match the panel counts.
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Density must be positive and finite.
    InvalidDensity { value: f64 },

    /// A coordinate, velocity or reference value is NaN or infinite.
    NonFinite { surface: String, what: &'static str },

    /// Surface id not present in the lattice.
    UnknownSurface { id: SurfaceId },

    /// The influence-coefficient provider failed.
    Provider { what: String },
}

impl std::fmt::Display for LatticeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatticeError::EmptyLattice => write!(f, "Lattice has no surfaces"),
            LatticeError::InvalidDims { surface, what } => {
                write!(f, "Surface '{}' has invalid dimensions: {}", surface, what)
            }
            LatticeError::DimensionMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            LatticeError::InvalidDensity { value } => {
                write!(f, "Density must be positive and finite, got {}", value)
            }
            LatticeError::NonFinite { surface, what } => {
                write!(f, "Surface '{}' has non-finite {}", surface, what)
            }
            LatticeError::UnknownSurface { id } => write!(f, "Surface {} not found", id),
            LatticeError::Provider { what } => write!(f, "Influence provider failed: {}", what),
        }
    }
}

impl std::error::Error for LatticeError {}
