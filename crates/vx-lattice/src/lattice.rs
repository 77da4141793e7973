//! Immutable lattice snapshot.

use nalgebra::{DVector, Vector3};
use vx_core::SurfaceId;

use crate::error::{LatticeError, LatticeResult};
use crate::indexing::SizeRecord;
use crate::surface::SurfaceGrid;

/// A validated collection of surfaces plus the free-stream density.
///
/// Built through [`crate::LatticeBuilder`]; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Lattice {
    pub(crate) surfaces: Vec<SurfaceGrid>,
    pub(crate) density: f64,
}

impl Lattice {
    pub fn surfaces(&self) -> &[SurfaceGrid] {
        &self.surfaces
    }

    pub fn n_surf(&self) -> usize {
        self.surfaces.len()
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn surface(&self, id: SurfaceId) -> LatticeResult<&SurfaceGrid> {
        self.surfaces
            .get(id.slot())
            .ok_or(LatticeError::UnknownSurface { id })
    }

    /// Surface ids in storage order.
    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        (0..self.surfaces.len() as u32).map(SurfaceId::from_index)
    }

    pub fn sizes(&self) -> SizeRecord {
        SizeRecord::from_lattice(self)
    }

    /// Pack a per-vertex field of every surface into one `3 * Kzeta` vector.
    ///
    /// Per surface the layout is `(3, m + 1, n + 1)` in C order; surfaces are stacked.
    pub fn pack_vertex_field<F>(&self, field: F) -> DVector<f64>
    where
        F: Fn(&SurfaceGrid) -> &[Vector3<f64>],
    {
        let total: usize = self.surfaces.iter().map(|s| 3 * s.kzeta()).sum();
        let mut out = DVector::zeros(total);
        let mut offset = 0;
        for surface in &self.surfaces {
            let kzeta = surface.kzeta();
            for (v, value) in field(surface).iter().enumerate() {
                for c in 0..3 {
                    out[offset + c * kzeta + v] = value[c];
                }
            }
            offset += 3 * kzeta;
        }
        out
    }

    /// Reference vertex positions in the packed vertex layout.
    pub fn packed_zeta(&self) -> DVector<f64> {
        self.pack_vertex_field(|s| &s.zeta)
    }

    /// Reference vertex forces in the packed vertex layout.
    pub fn packed_forces(&self) -> DVector<f64> {
        self.pack_vertex_field(|s| &s.forces)
    }
}
