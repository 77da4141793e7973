//! Influence-coefficient provider boundary.
//!
//! The provider owns the panel-geometry kernels (Biot-Savart type influence,
//! force sensitivities). Assembly only checks block shapes and combines them.
//! `target` indexes rows (collocation points or force vertices), `source`
//! indexes columns (panels or vertices).

use nalgebra::DMatrix;
use vx_core::SurfaceId;

use crate::error::LatticeResult;
use crate::indexing::SizeRecord;
use crate::lattice::Lattice;
use crate::wake::WakeKernel;

/// Per surface-pair influence and sensitivity blocks around a reference lattice.
///
/// Shapes use per-surface counts `K`, `K*`, `Kzeta`.
pub trait InfluenceProvider {
    /// Bound-panel normal-velocity influence at collocation points, `K_t x K_s`.
    fn bound_aic(&self, lattice: &Lattice, target: SurfaceId, source: SurfaceId)
    -> LatticeResult<DMatrix<f64>>;

    /// Wake-panel normal-velocity influence at collocation points, `K_t x K*_s`.
    fn wake_aic(&self, lattice: &Lattice, target: SurfaceId, source: SurfaceId)
    -> LatticeResult<DMatrix<f64>>;

    /// Collocation normal-velocity sensitivity to vertex displacement, `K_t x 3Kzeta_s`.
    fn normal_velocity_zeta(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>>;

    /// Collocation normal-velocity sensitivity to vertex velocity, `K x 3Kzeta`.
    fn normal_velocity_input(&self, lattice: &Lattice, surface: SurfaceId)
    -> LatticeResult<DMatrix<f64>>;

    /// Steady force sensitivity to vertex displacement at constant relative velocity,
    /// `3Kzeta x 3Kzeta`.
    fn force_zeta_vrel0(&self, lattice: &Lattice, surface: SurfaceId)
    -> LatticeResult<DMatrix<f64>>;

    /// Force sensitivity to vertex displacement through induced velocity,
    /// `3Kzeta_t x 3Kzeta_s`.
    fn force_induced_zeta(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>>;

    /// Steady force sensitivity to external velocity, `3Kzeta x 3Kzeta`.
    fn force_input(&self, lattice: &Lattice, surface: SurfaceId) -> LatticeResult<DMatrix<f64>>;

    /// Force sensitivity to bound and wake circulation at constant relative velocity,
    /// `(3Kzeta x K, 3Kzeta x K*)`.
    fn force_gamma_vrel0(
        &self,
        lattice: &Lattice,
        surface: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)>;

    /// Force sensitivity to bound and wake circulation through induced velocity,
    /// `(3Kzeta_t x K_s, 3Kzeta_t x K*_s)`.
    fn force_induced_gamma(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)>;

    /// Unsteady (added-mass) force sensitivity to circulation rate, `3Kzeta x K`.
    fn force_gamma_dot(&self, lattice: &Lattice, surface: SurfaceId)
    -> LatticeResult<DMatrix<f64>>;

    /// Wake convection kernel; one chordwise row per step unless overridden.
    fn wake_propagation(&self, sizes: &SizeRecord) -> WakeKernel {
        WakeKernel::new(sizes)
    }
}
