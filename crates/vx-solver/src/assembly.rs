//! Steady influence-system assembly.

use nalgebra::{DMatrix, DVector};
use vx_core::timing::Timer;
use vx_lattice::{InfluenceProvider, Lattice, SizeRecord, WakeKernel};

use crate::error::{SolverError, SolverResult};

/// Influence and sensitivity blocks of a lattice at its reference state.
///
/// Built once by [`SteadyAssembly::assemble`] and then shared read-only by the
/// steady solve and by every model derived from it.
#[derive(Debug, Clone)]
pub struct SteadyAssembly {
    pub sizes: SizeRecord,
    pub wake: WakeKernel,
    pub density: f64,
    /// Bound influence `A0` (K x K).
    pub aic: DMatrix<f64>,
    /// Wake influence `A0W` (K x K*).
    pub aic_wake: DMatrix<f64>,
    /// Bound influence with the steady wake folded onto trailing-edge columns (K x K).
    pub aic_folded: DMatrix<f64>,
    /// Normal velocity sensitivity to vertex displacement (K x 3Kzeta).
    pub ducdzeta: DMatrix<f64>,
    /// Normal velocity sensitivity to external velocity (K x 3Kzeta).
    pub ducdu_ext: DMatrix<f64>,
    /// Force sensitivity to vertex displacement (3Kzeta x 3Kzeta).
    pub dfqsdzeta: DMatrix<f64>,
    /// Force sensitivity to external velocity (3Kzeta x 3Kzeta).
    pub dfqsdu_ext: DMatrix<f64>,
    /// Force sensitivity to bound circulation (3Kzeta x K).
    pub dfqsdgamma: DMatrix<f64>,
    /// Force sensitivity to wake circulation (3Kzeta x K*).
    pub dfqsdgamma_star: DMatrix<f64>,
    /// Added-mass force sensitivity to circulation rate (3Kzeta x K).
    pub dfunstdgamma_dot: DMatrix<f64>,
    /// Reference vertex positions, packed vertex layout.
    pub zeta0: DVector<f64>,
    /// Reference vertex forces, packed vertex layout.
    pub forces0: DVector<f64>,
    /// Assembly time in seconds (0 unless timing is enabled).
    pub cpu_assemble: f64,
}

/// Copy a provider block into `out` at `(row, col)` after checking its shape.
fn place(
    out: &mut DMatrix<f64>,
    row: usize,
    col: usize,
    block: &DMatrix<f64>,
    expected: (usize, usize),
    what: &str,
) -> SolverResult<()> {
    if block.shape() != expected {
        return Err(SolverError::Dimension {
            what: what.to_string(),
            expected,
            actual: block.shape(),
        });
    }
    let mut view = out.view_mut((row, col), expected);
    view += block;
    Ok(())
}

impl SteadyAssembly {
    /// Assemble all steady blocks from the provider.
    ///
    /// Each provider block is folded into its final global matrix and dropped
    /// before the next one is requested.
    pub fn assemble<P>(lattice: &Lattice, provider: &P) -> SolverResult<Self>
    where
        P: InfluenceProvider + ?Sized,
    {
        let timer = Timer::start("steady assembly");
        let sizes = lattice.sizes();
        let (k, k_star, nz) = (sizes.k, sizes.k_star, sizes.n_vertex_dofs());

        let wake = provider.wake_propagation(&sizes);
        if (wake.k(), wake.k_star()) != (k, k_star) {
            return Err(SolverError::Dimension {
                what: "wake propagation kernel".into(),
                expected: (k_star, k),
                actual: (wake.k_star(), wake.k()),
            });
        }

        let ids: Vec<_> = lattice.ids().collect();
        let surf = |id| *sizes.surface(id);

        // state equation
        let mut aic = DMatrix::zeros(k, k);
        let mut aic_wake = DMatrix::zeros(k, k_star);
        let mut ducdzeta = DMatrix::zeros(k, nz);
        for &t in &ids {
            let st = surf(t);
            for &s in &ids {
                let ss = surf(s);
                place(
                    &mut aic,
                    st.k_offset,
                    ss.k_offset,
                    &provider.bound_aic(lattice, t, s)?,
                    (st.k, ss.k),
                    "bound AIC",
                )?;
                place(
                    &mut aic_wake,
                    st.k_offset,
                    ss.k_star_offset,
                    &provider.wake_aic(lattice, t, s)?,
                    (st.k, ss.k_star),
                    "wake AIC",
                )?;
                place(
                    &mut ducdzeta,
                    st.k_offset,
                    3 * ss.kzeta_offset,
                    &provider.normal_velocity_zeta(lattice, t, s)?,
                    (st.k, 3 * ss.kzeta),
                    "normal velocity / zeta",
                )?;
            }
        }
        let aic_folded = wake.fold(&aic, &aic_wake);

        let mut ducdu_ext = DMatrix::zeros(k, nz);
        for &t in &ids {
            let st = surf(t);
            place(
                &mut ducdu_ext,
                st.k_offset,
                3 * st.kzeta_offset,
                &provider.normal_velocity_input(lattice, t)?,
                (st.k, 3 * st.kzeta),
                "normal velocity / input",
            )?;
        }

        // output equation
        let mut dfqsdzeta = DMatrix::zeros(nz, nz);
        let mut dfqsdu_ext = DMatrix::zeros(nz, nz);
        let mut dfqsdgamma = DMatrix::zeros(nz, k);
        let mut dfqsdgamma_star = DMatrix::zeros(nz, k_star);
        let mut dfunstdgamma_dot = DMatrix::zeros(nz, k);
        for &t in &ids {
            let st = surf(t);
            let r0 = 3 * st.kzeta_offset;
            let rows = 3 * st.kzeta;
            place(
                &mut dfqsdzeta,
                r0,
                r0,
                &provider.force_zeta_vrel0(lattice, t)?,
                (rows, rows),
                "force / zeta at constant relative velocity",
            )?;
            place(
                &mut dfqsdu_ext,
                r0,
                r0,
                &provider.force_input(lattice, t)?,
                (rows, rows),
                "force / input velocity",
            )?;
            {
                let (bound, wake_blk) = provider.force_gamma_vrel0(lattice, t)?;
                place(&mut dfqsdgamma, r0, st.k_offset, &bound, (rows, st.k), "force / gamma")?;
                place(
                    &mut dfqsdgamma_star,
                    r0,
                    st.k_star_offset,
                    &wake_blk,
                    (rows, st.k_star),
                    "force / gamma_star",
                )?;
            }
            place(
                &mut dfunstdgamma_dot,
                r0,
                st.k_offset,
                &provider.force_gamma_dot(lattice, t)?,
                (rows, st.k),
                "force / gamma_dot",
            )?;

            for &s in &ids {
                let ss = surf(s);
                place(
                    &mut dfqsdzeta,
                    r0,
                    3 * ss.kzeta_offset,
                    &provider.force_induced_zeta(lattice, t, s)?,
                    (rows, 3 * ss.kzeta),
                    "force / zeta induced",
                )?;
                let (bound, wake_blk) = provider.force_induced_gamma(lattice, t, s)?;
                place(
                    &mut dfqsdgamma,
                    r0,
                    ss.k_offset,
                    &bound,
                    (rows, ss.k),
                    "force / gamma induced",
                )?;
                place(
                    &mut dfqsdgamma_star,
                    r0,
                    ss.k_star_offset,
                    &wake_blk,
                    (rows, ss.k_star),
                    "force / gamma_star induced",
                )?;
            }
        }

        let cpu_assemble = timer.stop_and_log();
        tracing::info!(k, k_star, kzeta = sizes.kzeta, "steady assembly done");

        Ok(Self {
            wake,
            density: lattice.density(),
            aic,
            aic_wake,
            aic_folded,
            ducdzeta,
            ducdu_ext,
            dfqsdzeta,
            dfqsdu_ext,
            dfqsdgamma,
            dfqsdgamma_star,
            dfunstdgamma_dot,
            zeta0: lattice.packed_zeta(),
            forces0: lattice.packed_forces(),
            cpu_assemble,
            sizes,
        })
    }

    pub fn k(&self) -> usize {
        self.sizes.k
    }

    pub fn k_star(&self) -> usize {
        self.sizes.k_star
    }

    pub fn kzeta(&self) -> usize {
        self.sizes.kzeta
    }
}
