//! Incremental lattice builder.

use vx_core::SurfaceId;

use crate::error::LatticeResult;
use crate::lattice::Lattice;
use crate::surface::SurfaceGrid;
use crate::validate;

/// Builder for a lattice snapshot.
///
/// Add surfaces with `add_surface`, then call `build()` to validate and
/// freeze them into an immutable [`Lattice`].
#[derive(Debug, Default)]
pub struct LatticeBuilder {
    surfaces: Vec<SurfaceGrid>,
    density: f64,
}

impl LatticeBuilder {
    pub fn new(density: f64) -> Self {
        Self {
            surfaces: Vec::new(),
            density,
        }
    }

    /// Add a surface and return its id.
    pub fn add_surface(&mut self, surface: SurfaceGrid) -> SurfaceId {
        let id = SurfaceId::from_index(self.surfaces.len() as u32);
        self.surfaces.push(surface);
        id
    }

    pub fn set_density(&mut self, density: f64) {
        self.density = density;
    }

    /// Validate and return the immutable lattice.
    pub fn build(self) -> LatticeResult<Lattice> {
        validate::validate_density(self.density)?;
        validate::validate_surfaces(&self.surfaces)?;

        tracing::debug!(
            surfaces = self.surfaces.len(),
            density = self.density,
            "lattice built"
        );

        Ok(Lattice {
            surfaces: self.surfaces,
            density: self.density,
        })
    }
}
