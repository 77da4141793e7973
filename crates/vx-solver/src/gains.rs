//! Constant gain matrices acting on packed vertex vectors.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use vx_core::SurfaceId;
use vx_lattice::SizeRecord;

use crate::assembly::SteadyAssembly;

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

fn vertex_at(vec: &DVector<f64>, dofs: [usize; 3]) -> Vector3<f64> {
    Vector3::new(vec[dofs[0]], vec[dofs[1]], vec[dofs[2]])
}

fn set_block(out: &mut DMatrix<f64>, rows: [usize; 3], cols: [usize; 3], block: &Matrix3<f64>) {
    for (r, &i) in rows.iter().enumerate() {
        for (c, &j) in cols.iter().enumerate() {
            out[(i, j)] = block[(r, c)];
        }
    }
}

/// Total force and moment gains.
///
/// For a force perturbation `df` and displacement `dzeta`:
/// `dF = kftot df`, `dM = kmtot df + kmtot_disp dzeta`.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceGains {
    pub kftot: DMatrix<f64>,
    pub kmtot: DMatrix<f64>,
    pub kmtot_disp: DMatrix<f64>,
}

impl ForceGains {
    pub fn new(
        sizes: &SizeRecord,
        zeta0: &DVector<f64>,
        forces0: &DVector<f64>,
        pole: Vector3<f64>,
    ) -> Self {
        let nz = sizes.n_vertex_dofs();
        let mut kftot = DMatrix::zeros(3, nz);
        let mut kmtot = DMatrix::zeros(3, nz);
        let mut kmtot_disp = DMatrix::zeros(3, nz);
        for (i, s) in sizes.surfaces().iter().enumerate() {
            let id = SurfaceId::from_index(i as u32);
            for v in 0..s.kzeta {
                let dofs = sizes.vertex_dofs(id, v);
                set_block(&mut kftot, [0, 1, 2], dofs, &Matrix3::identity());
                set_block(&mut kmtot, [0, 1, 2], dofs, &skew(&(vertex_at(zeta0, dofs) - pole)));
                set_block(&mut kmtot_disp, [0, 1, 2], dofs, &skew(&(-vertex_at(forces0, dofs))));
            }
        }
        Self {
            kftot,
            kmtot,
            kmtot_disp,
        }
    }
}

/// Sectional force and moment gains, one section per spanwise vertex line.
///
/// Section `nn` of a surface occupies rows `3 * (n + 1)` wide, component-major.
/// Moments are taken about the section's chordwise mid-vertex `m / 2`.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionalGains {
    pub kfsec: DMatrix<f64>,
    pub kmsec: DMatrix<f64>,
}

impl SectionalGains {
    pub fn new(sizes: &SizeRecord, zeta0: &DVector<f64>) -> Self {
        let nz = sizes.n_vertex_dofs();
        let nsec = sizes.n_sections();
        let mut kfsec = DMatrix::zeros(3 * nsec, nz);
        let mut kmsec = DMatrix::zeros(3 * nsec, nz);
        let mut row0 = 0;
        for (i, s) in sizes.surfaces().iter().enumerate() {
            let id = SurfaceId::from_index(i as u32);
            for nn in 0..=s.n {
                let rows = [0, 1, 2].map(|c| row0 + c * (s.n + 1) + nn);
                let mid = vertex_at(zeta0, sizes.vertex_dofs(id, (s.m / 2) * (s.n + 1) + nn));
                for mm in 0..=s.m {
                    let dofs = sizes.vertex_dofs(id, mm * (s.n + 1) + nn);
                    set_block(&mut kfsec, rows, dofs, &Matrix3::identity());
                    set_block(&mut kmsec, rows, dofs, &skew(&(vertex_at(zeta0, dofs) - mid)));
                }
            }
            row0 += 3 * (s.n + 1);
        }
        Self { kfsec, kmsec }
    }
}

/// Rigid-body motion gains about a pivot.
///
/// `dzeta = ktra u_tra + krot u_rot`, `dzeta_dot = ktra_dot u_tra_dot + krot_dot u_rot_dot`,
/// with small rotations about the inertial x, y, z axes.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidMotionGains {
    pub ktra: DMatrix<f64>,
    pub ktra_dot: DMatrix<f64>,
    pub krot: DMatrix<f64>,
    pub krot_dot: DMatrix<f64>,
}

impl RigidMotionGains {
    pub fn new(sizes: &SizeRecord, zeta0: &DVector<f64>, pivot: Vector3<f64>) -> Self {
        let nz = sizes.n_vertex_dofs();
        let mut ktra = DMatrix::zeros(nz, 3);
        let mut krot = DMatrix::zeros(nz, 3);
        for (i, s) in sizes.surfaces().iter().enumerate() {
            let id = SurfaceId::from_index(i as u32);
            for v in 0..s.kzeta {
                let dofs = sizes.vertex_dofs(id, v);
                set_block(&mut ktra, dofs, [0, 1, 2], &Matrix3::identity());
                // theta x r = -skew(r) theta
                let r = vertex_at(zeta0, dofs) - pivot;
                set_block(&mut krot, dofs, [0, 1, 2], &(-skew(&r)));
            }
        }
        Self {
            ktra_dot: ktra.clone(),
            krot_dot: krot.clone(),
            ktra,
            krot,
        }
    }
}

impl SteadyAssembly {
    pub fn force_gains(&self, pole: Vector3<f64>) -> ForceGains {
        ForceGains::new(&self.sizes, &self.zeta0, &self.forces0, pole)
    }

    pub fn sectional_gains(&self) -> SectionalGains {
        SectionalGains::new(&self.sizes, &self.zeta0)
    }

    pub fn rigid_motion_gains(&self, pivot: Vector3<f64>) -> RigidMotionGains {
        RigidMotionGains::new(&self.sizes, &self.zeta0, pivot)
    }
}
