//! Steady solve for bound circulation and vertex forces.

use nalgebra::{DMatrix, DVector, Vector3};
use vx_core::SurfaceId;
use vx_core::timing::Timer;
use vx_lattice::SizeRecord;

use crate::assembly::SteadyAssembly;
use crate::error::{SolverError, SolverResult};
use crate::linalg::{factorize, lu_solve_vec};

/// Vertex perturbations driving the steady solve, each of length `3 * Kzeta`.
#[derive(Clone, Debug, PartialEq)]
pub struct SteadyInput {
    pub zeta: DVector<f64>,
    pub zeta_dot: DVector<f64>,
    pub u_ext: DVector<f64>,
}

impl SteadyInput {
    pub fn zeros(sizes: &SizeRecord) -> Self {
        let n = sizes.n_vertex_dofs();
        Self {
            zeta: DVector::zeros(n),
            zeta_dot: DVector::zeros(n),
            u_ext: DVector::zeros(n),
        }
    }

    /// Split a stacked `[zeta; zeta_dot; u_ext]` vector.
    pub fn from_stacked(u: &DVector<f64>, sizes: &SizeRecord) -> SolverResult<Self> {
        let n = sizes.n_vertex_dofs();
        if u.len() != 3 * n {
            return Err(SolverError::Dimension {
                what: "stacked input".into(),
                expected: (3 * n, 1),
                actual: (u.len(), 1),
            });
        }
        Ok(Self {
            zeta: u.rows(0, n).into_owned(),
            zeta_dot: u.rows(n, n).into_owned(),
            u_ext: u.rows(2 * n, n).into_owned(),
        })
    }

    pub fn stacked(&self) -> DVector<f64> {
        let n = self.zeta.len();
        let mut out = DVector::zeros(3 * n);
        out.rows_mut(0, n).copy_from(&self.zeta);
        out.rows_mut(n, n).copy_from(&self.zeta_dot);
        out.rows_mut(2 * n, n).copy_from(&self.u_ext);
        out
    }

    fn validate(&self, sizes: &SizeRecord) -> SolverResult<()> {
        let n = sizes.n_vertex_dofs();
        for (what, v) in [
            ("zeta", &self.zeta),
            ("zeta_dot", &self.zeta_dot),
            ("u_ext", &self.u_ext),
        ] {
            if v.len() != n {
                return Err(SolverError::Dimension {
                    what: what.into(),
                    expected: (n, 1),
                    actual: (v.len(), 1),
                });
            }
        }
        Ok(())
    }
}

/// Steady reference state.
#[derive(Clone, Debug, PartialEq)]
pub struct SteadySolution {
    /// Bound circulation (K).
    pub gamma: DVector<f64>,
    /// Wake circulation (K*), trailing-edge circulation replicated chordwise.
    pub gamma_star: DVector<f64>,
    /// Vertex forces (3 Kzeta).
    pub fqs: DVector<f64>,
}

/// Per-surface view of a steady solution.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceSolution {
    /// `m x n` bound circulation.
    pub gamma: DMatrix<f64>,
    /// Force components, each `(m + 1) x (n + 1)`.
    pub forces: [DMatrix<f64>; 3],
}

impl SteadyAssembly {
    /// Solve `AIC_folded * gamma = -(Ducdu_ext (u_ext - zeta_dot) + Ducdzeta zeta)`.
    pub fn solve(&self, input: &SteadyInput) -> SolverResult<SteadySolution> {
        input.validate(&self.sizes)?;
        let timer = Timer::start("steady solve");

        let urel = &input.u_ext - &input.zeta_dot;
        let bv = &self.ducdu_ext * &urel + &self.ducdzeta * &input.zeta;
        let lu = factorize(self.aic_folded.clone(), "steady influence matrix")?;
        let gamma = lu_solve_vec(&lu, &(-bv), "steady influence matrix")?;
        let gamma_star = self.wake.replicate(&gamma);

        let fqs = &self.dfqsdgamma * &gamma
            + &self.dfqsdgamma_star * &gamma_star
            + &self.dfqsdzeta * &input.zeta
            + &self.dfqsdu_ext * &urel;

        let elapsed = timer.stop_and_log();
        tracing::debug!(
            gamma_max = gamma.amax(),
            elapsed_s = elapsed,
            "steady solve done"
        );
        Ok(SteadySolution {
            gamma,
            gamma_star,
            fqs,
        })
    }

    /// Total force and moment about `pole` from a vertex force vector,
    /// using the reference vertex positions.
    pub fn total_forces(&self, fqs: &DVector<f64>, pole: Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        let mut ftot = Vector3::zeros();
        let mut mtot = Vector3::zeros();
        for (i, s) in self.sizes.surfaces().iter().enumerate() {
            let id = SurfaceId::from_index(i as u32);
            for v in 0..s.kzeta {
                let [x, y, z] = self.sizes.vertex_dofs(id, v);
                let f = Vector3::new(fqs[x], fqs[y], fqs[z]);
                let r = Vector3::new(self.zeta0[x], self.zeta0[y], self.zeta0[z]) - pole;
                ftot += f;
                mtot += r.cross(&f);
            }
        }
        (ftot, mtot)
    }
}

impl SteadySolution {
    /// Reshape into per-surface grids.
    pub fn reshape(&self, sizes: &SizeRecord) -> Vec<SurfaceSolution> {
        sizes
            .surfaces()
            .iter()
            .map(|s| {
                let gamma = DMatrix::from_fn(s.m, s.n, |mm, nn| self.gamma[s.k_offset + mm * s.n + nn]);
                let base = 3 * s.kzeta_offset;
                let component = |c: usize| {
                    DMatrix::from_fn(s.m + 1, s.n + 1, |mm, nn| {
                        self.fqs[base + c * s.kzeta + mm * (s.n + 1) + nn]
                    })
                };
                SurfaceSolution {
                    gamma,
                    forces: [component(0), component(1), component(2)],
                }
            })
            .collect()
    }
}
