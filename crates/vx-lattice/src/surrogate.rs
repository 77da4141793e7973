//! Deterministic surrogate influence provider.
//!
//! Replaces Biot-Savart kernels with an exponential distance decay and
//! applies Kutta-Joukowski segment forces on the ring-vortex edges that
//! carry spanwise circulation. Blocks have the exact shapes and sign
//! conventions of a full provider, which is enough for assembling, testing
//! and exercising the engine without panel-geometry kernels.

use nalgebra::{DMatrix, Matrix3, Vector3};
use vx_core::SurfaceId;

use crate::error::LatticeResult;
use crate::influence::InfluenceProvider;
use crate::lattice::Lattice;
use crate::surface::SurfaceGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurrogateInfluence {
    /// Off-diagonal bound influence magnitude (self influence is -1).
    pub bound_coupling: f64,
    /// Wake influence magnitude.
    pub wake_coupling: f64,
    /// Decay length in units of the target surface's panel length.
    pub decay_panels: f64,
}

impl Default for SurrogateInfluence {
    fn default() -> Self {
        Self {
            bound_coupling: 0.1,
            wake_coupling: 0.1,
            decay_panels: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Owner {
    Bound(usize),
    Wake(usize),
}

/// Spanwise ring edge `a -> b` carrying `sign * circulation(owner)`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: usize,
    b: usize,
    owner: Owner,
    sign: f64,
    normal: Vector3<f64>,
}

impl Segment {
    fn vector(&self, s: &SurfaceGrid) -> Vector3<f64> {
        s.zeta[self.b] - s.zeta[self.a]
    }

    fn velocity(&self, s: &SurfaceGrid) -> Vector3<f64> {
        0.5 * (s.relative_velocity(self.a) + s.relative_velocity(self.b))
    }

    fn midpoint(&self, s: &SurfaceGrid) -> Vector3<f64> {
        0.5 * (s.zeta[self.a] + s.zeta[self.b])
    }

    fn reference_circulation(&self, s: &SurfaceGrid) -> f64 {
        match self.owner {
            Owner::Bound(p) => s.gamma[p],
            Owner::Wake(p) => s.gamma_star[p],
        }
    }
}

/// Leading and trailing spanwise edges of every bound ring, plus the first
/// wake row's leading edge on the trailing edge.
fn segments(s: &SurfaceGrid) -> Vec<Segment> {
    let mut out = Vec::with_capacity(2 * s.k() + s.n);
    for mm in 0..s.m {
        for nn in 0..s.n {
            let p = s.panel_index(mm, nn);
            let normal = s.panel_normal(mm, nn);
            out.push(Segment {
                a: s.vertex_index(mm, nn),
                b: s.vertex_index(mm, nn + 1),
                owner: Owner::Bound(p),
                sign: 1.0,
                normal,
            });
            out.push(Segment {
                a: s.vertex_index(mm + 1, nn),
                b: s.vertex_index(mm + 1, nn + 1),
                owner: Owner::Bound(p),
                sign: -1.0,
                normal,
            });
        }
    }
    for nn in 0..s.n {
        out.push(Segment {
            a: s.vertex_index(s.m, nn),
            b: s.vertex_index(s.m, nn + 1),
            owner: Owner::Wake(nn),
            sign: 1.0,
            normal: s.panel_normal(s.m - 1, nn),
        });
    }
    out
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Add a 3-vector at the three DOFs of `vertex` (layout `c * kzeta + vertex`).
fn add_vertex_column(
    out: &mut DMatrix<f64>,
    kzeta: usize,
    vertex: usize,
    col: usize,
    f: &Vector3<f64>,
) {
    for c in 0..3 {
        out[(c * kzeta + vertex, col)] += f[c];
    }
}

/// Add a 3x3 block coupling DOFs of `row_vertex` and `col_vertex`.
fn add_vertex_block(
    out: &mut DMatrix<f64>,
    kzeta: usize,
    row_vertex: usize,
    col_vertex: usize,
    block: &Matrix3<f64>,
) {
    for r in 0..3 {
        for c in 0..3 {
            out[(r * kzeta + row_vertex, c * kzeta + col_vertex)] += block[(r, c)];
        }
    }
}

impl SurrogateInfluence {
    fn decay_length(&self, target: &SurfaceGrid) -> f64 {
        (self.decay_panels * target.panel_length()).max(f64::MIN_POSITIVE)
    }

    fn coupling(kappa: f64, distance: f64, length: f64) -> f64 {
        -kappa * (-distance / length).exp()
    }
}

impl InfluenceProvider for SurrogateInfluence {
    fn bound_aic(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let t = lattice.surface(target)?;
        let s = lattice.surface(source)?;
        let length = self.decay_length(t);
        let mut out = DMatrix::zeros(t.k(), s.k());
        for (mi, ni) in (0..t.m).flat_map(|mm| (0..t.n).map(move |nn| (mm, nn))) {
            let i = t.panel_index(mi, ni);
            let xi = t.collocation(mi, ni);
            for (mj, nj) in (0..s.m).flat_map(|mm| (0..s.n).map(move |nn| (mm, nn))) {
                let j = s.panel_index(mj, nj);
                out[(i, j)] = if target == source && i == j {
                    -1.0
                } else {
                    let d = (xi - s.collocation(mj, nj)).norm();
                    Self::coupling(self.bound_coupling, d, length)
                };
            }
        }
        Ok(out)
    }

    fn wake_aic(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let t = lattice.surface(target)?;
        let s = lattice.surface(source)?;
        let length = self.decay_length(t);
        let mut out = DMatrix::zeros(t.k(), s.k_star());
        for mi in 0..t.m {
            for ni in 0..t.n {
                let i = t.panel_index(mi, ni);
                let xi = t.collocation(mi, ni);
                for mj in 0..s.m_star {
                    for nj in 0..s.n {
                        let d = (xi - s.wake_centroid(mj, nj)).norm();
                        out[(i, mj * s.n + nj)] = Self::coupling(self.wake_coupling, d, length);
                    }
                }
            }
        }
        Ok(out)
    }

    fn normal_velocity_zeta(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let t = lattice.surface(target)?;
        let s = lattice.surface(source)?;
        let mut out = DMatrix::zeros(t.k(), 3 * s.kzeta());
        if target != source {
            return Ok(out);
        }
        // panel rotation under the mean relative velocity
        for mm in 0..t.m {
            for nn in 0..t.n {
                let p = t.panel_index(mm, nn);
                let corners = t.panel_vertices(mm, nn);
                let vrel = corners
                    .iter()
                    .map(|&v| t.relative_velocity(v))
                    .sum::<Vector3<f64>>()
                    * 0.25;
                let chord = t.panel_chord(mm, nn);
                let dx = chord.norm();
                if dx == 0.0 {
                    continue;
                }
                let g = 0.5 * vrel.dot(&(chord / dx)) / dx;
                let normal = t.panel_normal(mm, nn);
                for (slot, &v) in corners.iter().enumerate() {
                    let sign = if slot < 2 { 1.0 } else { -1.0 };
                    for c in 0..3 {
                        out[(p, c * t.kzeta() + v)] += sign * g * normal[c];
                    }
                }
            }
        }
        Ok(out)
    }

    fn normal_velocity_input(
        &self,
        lattice: &Lattice,
        surface: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let s = lattice.surface(surface)?;
        let mut out = DMatrix::zeros(s.k(), 3 * s.kzeta());
        for mm in 0..s.m {
            for nn in 0..s.n {
                let p = s.panel_index(mm, nn);
                let normal = s.panel_normal(mm, nn);
                for v in s.panel_vertices(mm, nn) {
                    for c in 0..3 {
                        out[(p, c * s.kzeta() + v)] += 0.25 * normal[c];
                    }
                }
            }
        }
        Ok(out)
    }

    fn force_zeta_vrel0(
        &self,
        lattice: &Lattice,
        surface: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let s = lattice.surface(surface)?;
        let kzeta = s.kzeta();
        let rho = lattice.density();
        let mut out = DMatrix::zeros(3 * kzeta, 3 * kzeta);
        for seg in segments(s) {
            let c = 0.5 * rho * seg.sign * seg.reference_circulation(s);
            if c == 0.0 {
                continue;
            }
            let block = skew(&seg.velocity(s)) * c;
            for x in [seg.a, seg.b] {
                add_vertex_block(&mut out, kzeta, x, seg.b, &block);
                add_vertex_block(&mut out, kzeta, x, seg.a, &(-block));
            }
        }
        Ok(out)
    }

    fn force_induced_zeta(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        // geometry-induced velocity changes are neglected by this surrogate
        let t = lattice.surface(target)?;
        let s = lattice.surface(source)?;
        Ok(DMatrix::zeros(3 * t.kzeta(), 3 * s.kzeta()))
    }

    fn force_input(&self, lattice: &Lattice, surface: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        let s = lattice.surface(surface)?;
        let kzeta = s.kzeta();
        let rho = lattice.density();
        let mut out = DMatrix::zeros(3 * kzeta, 3 * kzeta);
        for seg in segments(s) {
            let c = 0.5 * rho * seg.sign * seg.reference_circulation(s);
            if c == 0.0 {
                continue;
            }
            // V x l = -skew(l) V, V averaged over both segment ends
            let block = skew(&seg.vector(s)) * (-0.5 * c);
            for x in [seg.a, seg.b] {
                for y in [seg.a, seg.b] {
                    add_vertex_block(&mut out, kzeta, x, y, &block);
                }
            }
        }
        Ok(out)
    }

    fn force_gamma_vrel0(
        &self,
        lattice: &Lattice,
        surface: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)> {
        let s = lattice.surface(surface)?;
        let kzeta = s.kzeta();
        let rho = lattice.density();
        let mut bound = DMatrix::zeros(3 * kzeta, s.k());
        let mut wake = DMatrix::zeros(3 * kzeta, s.k_star());
        for seg in segments(s) {
            let f = seg.velocity(s).cross(&seg.vector(s)) * (0.5 * rho * seg.sign);
            let (out, col) = match seg.owner {
                Owner::Bound(p) => (&mut bound, p),
                Owner::Wake(p) => (&mut wake, p),
            };
            add_vertex_column(out, kzeta, seg.a, col, &f);
            add_vertex_column(out, kzeta, seg.b, col, &f);
        }
        Ok((bound, wake))
    }

    fn force_induced_gamma(
        &self,
        lattice: &Lattice,
        target: SurfaceId,
        source: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)> {
        let t = lattice.surface(target)?;
        let s = lattice.surface(source)?;
        let kzeta = t.kzeta();
        let rho = lattice.density();
        let length = self.decay_length(t);
        let mut bound = DMatrix::zeros(3 * kzeta, s.k());
        let mut wake = DMatrix::zeros(3 * kzeta, s.k_star());
        for seg in segments(t) {
            let c = 0.5 * rho * seg.sign * seg.reference_circulation(t);
            if c == 0.0 {
                continue;
            }
            // induced velocity along the owner panel normal
            let dir = seg.normal.cross(&seg.vector(t)) * c;
            let mid = seg.midpoint(t);
            for mm in 0..s.m {
                for nn in 0..s.n {
                    let d = (mid - s.collocation(mm, nn)).norm();
                    let f = dir * Self::coupling(self.bound_coupling, d, length);
                    let col = s.panel_index(mm, nn);
                    add_vertex_column(&mut bound, kzeta, seg.a, col, &f);
                    add_vertex_column(&mut bound, kzeta, seg.b, col, &f);
                }
            }
            for mm in 0..s.m_star {
                for nn in 0..s.n {
                    let d = (mid - s.wake_centroid(mm, nn)).norm();
                    let f = dir * Self::coupling(self.wake_coupling, d, length);
                    let col = mm * s.n + nn;
                    add_vertex_column(&mut wake, kzeta, seg.a, col, &f);
                    add_vertex_column(&mut wake, kzeta, seg.b, col, &f);
                }
            }
        }
        Ok((bound, wake))
    }

    fn force_gamma_dot(
        &self,
        lattice: &Lattice,
        surface: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        let s = lattice.surface(surface)?;
        let kzeta = s.kzeta();
        let rho = lattice.density();
        let mut out = DMatrix::zeros(3 * kzeta, s.k());
        for mm in 0..s.m {
            for nn in 0..s.n {
                let p = s.panel_index(mm, nn);
                let f = s.panel_normal(mm, nn) * (0.25 * rho * s.panel_area(mm, nn));
                for v in s.panel_vertices(mm, nn) {
                    add_vertex_column(&mut out, kzeta, v, p, &f);
                }
            }
        }
        Ok(out)
    }
}
