//! Wake propagation kernel.
//!
//! Each step the wake convects one chordwise row: the first wake row takes
//! the trailing-edge bound circulation and row `mm` takes row `mm - 1`.
//! The last row's circulation leaves the lattice.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CooMatrix;
use num_complex::Complex64;
use vx_core::MatrixLike;

use crate::indexing::SizeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WakeStrip {
    k_offset: usize,
    k_star_offset: usize,
    m: usize,
    n: usize,
    m_star: usize,
}

impl WakeStrip {
    fn trailing_edge(&self, nn: usize) -> usize {
        self.k_offset + self.n * (self.m - 1) + nn
    }

    fn wake(&self, mm: usize, nn: usize) -> usize {
        self.k_star_offset + mm * self.n + nn
    }
}

/// Convection links between bound and wake panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeKernel {
    strips: Vec<WakeStrip>,
    k: usize,
    k_star: usize,
}

impl WakeKernel {
    pub fn new(sizes: &SizeRecord) -> Self {
        let strips = sizes
            .surfaces()
            .iter()
            .map(|s| WakeStrip {
                k_offset: s.k_offset,
                k_star_offset: s.k_star_offset,
                m: s.m,
                n: s.n,
                m_star: s.m_star,
            })
            .collect();
        Self {
            strips,
            k: sizes.k,
            k_star: sizes.k_star,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn k_star(&self) -> usize {
        self.k_star
    }

    /// `Cgamma` (K* x K): first wake row <- trailing-edge bound panels.
    pub fn cgamma<M: MatrixLike>(&self) -> M {
        let mut entries = Vec::new();
        for s in &self.strips {
            for nn in 0..s.n {
                entries.push((s.wake(0, nn), s.trailing_edge(nn), 1.0));
            }
        }
        let mut out = M::zeros(self.k_star, self.k);
        out.add_triplets(0, 0, &entries, 1.0);
        out
    }

    /// `CgammaW` (K* x K*): wake row `mm` <- row `mm - 1`. Nilpotent.
    pub fn cgamma_w<M: MatrixLike>(&self) -> M {
        let mut entries = Vec::new();
        for s in &self.strips {
            for mm in 1..s.m_star {
                for nn in 0..s.n {
                    entries.push((s.wake(mm, nn), s.wake(mm - 1, nn), 1.0));
                }
            }
        }
        let mut out = M::zeros(self.k_star, self.k_star);
        out.add_triplets(0, 0, &entries, 1.0);
        out
    }

    /// Steady replication (K* x K): every wake row <- trailing edge.
    pub fn steady_replication<M: MatrixLike>(&self) -> M {
        let mut entries = Vec::new();
        for s in &self.strips {
            for mm in 0..s.m_star {
                for nn in 0..s.n {
                    entries.push((s.wake(mm, nn), s.trailing_edge(nn), 1.0));
                }
            }
        }
        let mut out = M::zeros(self.k_star, self.k);
        out.add_triplets(0, 0, &entries, 1.0);
        out
    }

    /// Steady wake circulation: `m_star` copies of the trailing-edge row.
    pub fn replicate(&self, gamma: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.k_star);
        for s in &self.strips {
            for mm in 0..s.m_star {
                for nn in 0..s.n {
                    out[s.wake(mm, nn)] = gamma[s.trailing_edge(nn)];
                }
            }
        }
        out
    }

    /// Fold wake columns onto the trailing-edge columns: `aic + aic_wake * E`,
    /// with `E` the steady replication matrix.
    pub fn fold(&self, aic: &DMatrix<f64>, aic_wake: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = aic.clone();
        for s in &self.strips {
            for mm in 0..s.m_star {
                for nn in 0..s.n {
                    let src = aic_wake.column(s.wake(mm, nn));
                    let mut dst = out.column_mut(s.trailing_edge(nn));
                    dst += src;
                }
            }
        }
        out
    }

    /// Wake image of bound circulation at `z = exp(i w dt)`.
    ///
    /// Wake row `mm` holds the trailing-edge circulation delayed by `mm + 1`
    /// steps, so its entry is `z^-(mm + 1)`.
    pub fn at_frequency(&self, z: Complex64) -> WakeAtFrequency {
        let zinv = z.inv();
        let mut coo = CooMatrix::new(self.k_star, self.k);
        for s in &self.strips {
            let mut factor = zinv;
            for mm in 0..s.m_star {
                for nn in 0..s.n {
                    coo.push(s.wake(mm, nn), s.trailing_edge(nn), factor);
                }
                factor *= zinv;
            }
        }
        WakeAtFrequency { z, coo }
    }

    /// Solve `(s I - CgammaW^T) q = r` by back substitution along each wake strip.
    ///
    /// `CgammaW^T` maps each wake panel onto its downstream neighbour, so rows
    /// are processed from the last wake row forwards.
    pub fn solve_shift_transpose(&self, s_shift: Complex64, r: &DMatrix<Complex64>) -> DMatrix<Complex64> {
        let mut q = r.clone();
        let sinv = s_shift.inv();
        for s in &self.strips {
            for mm in (0..s.m_star).rev() {
                for nn in 0..s.n {
                    let row = s.wake(mm, nn);
                    if mm + 1 < s.m_star {
                        let downstream = q.row(s.wake(mm + 1, nn)).clone_owned();
                        let mut target = q.row_mut(row);
                        target += downstream;
                    }
                    let mut target = q.row_mut(row);
                    target *= sinv;
                }
            }
        }
        q
    }
}

/// Sparse `Cw(z)` (K* x K) mapping bound circulation to its wake image.
#[derive(Debug, Clone)]
pub struct WakeAtFrequency {
    z: Complex64,
    coo: CooMatrix<Complex64>,
}

impl WakeAtFrequency {
    pub fn z(&self) -> Complex64 {
        self.z
    }

    pub fn coo(&self) -> &CooMatrix<Complex64> {
        &self.coo
    }

    /// `Cw * x` (K* x ncols).
    pub fn apply(&self, x: &DMatrix<Complex64>) -> DMatrix<Complex64> {
        let mut out = DMatrix::zeros(self.coo.nrows(), x.ncols());
        for (i, j, v) in self.coo.triplet_iter() {
            let mut row = out.row_mut(i);
            row += x.row(j) * *v;
        }
        out
    }

    /// `Cw^H * y` (K x ncols).
    pub fn adjoint_apply(&self, y: &DMatrix<Complex64>) -> DMatrix<Complex64> {
        let mut out = DMatrix::zeros(self.coo.ncols(), y.ncols());
        for (i, j, v) in self.coo.triplet_iter() {
            let mut row = out.row_mut(j);
            row += y.row(i) * v.conj();
        }
        out
    }

    /// `lhs * Cw` for a real `lhs` with K* columns.
    pub fn premul_real(&self, lhs: &DMatrix<f64>) -> DMatrix<Complex64> {
        let mut out = DMatrix::zeros(lhs.nrows(), self.coo.ncols());
        for (i, j, v) in self.coo.triplet_iter() {
            for r in 0..lhs.nrows() {
                out[(r, j)] += *v * lhs[(r, i)];
            }
        }
        out
    }

    pub fn to_dense(&self) -> DMatrix<Complex64> {
        let mut out = DMatrix::zeros(self.coo.nrows(), self.coo.ncols());
        for (i, j, v) in self.coo.triplet_iter() {
            out[(i, j)] += *v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vx_core::SparseMatrix;

    fn kernel() -> WakeKernel {
        WakeKernel::new(&SizeRecord::from_dims([(2, 2, 3), (1, 1, 2)]))
    }

    fn cpx(m: &DMatrix<f64>) -> DMatrix<Complex64> {
        m.map(|v| Complex64::new(v, 0.0))
    }

    #[test]
    fn shift_is_nilpotent() {
        let w = kernel();
        let cw: DMatrix<f64> = w.cgamma_w();
        let mut p = cw.clone();
        for _ in 1..3 {
            p = &p * &cw;
        }
        assert_eq!(p.amax(), 0.0);
        let sparse: SparseMatrix = w.cgamma_w();
        assert_eq!(sparse.to_dense(), cw);
    }

    #[test]
    fn replication_matches_shift_fixed_point() {
        let w = kernel();
        let gamma = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let star = w.replicate(&gamma);
        let cg: DMatrix<f64> = w.cgamma();
        let cgw: DMatrix<f64> = w.cgamma_w();
        let next = &cg * &gamma + &cgw * &star;
        assert_eq!(next, star);
        let e: DMatrix<f64> = w.steady_replication();
        assert_eq!(&e * &gamma, star);
        assert_eq!(star.as_slice(), &[3.0, 4.0, 3.0, 4.0, 3.0, 4.0, 5.0, 5.0]);
    }

    #[test]
    fn fold_adds_wake_columns_to_trailing_edge() {
        let w = kernel();
        let aic = DMatrix::<f64>::identity(5, 5);
        let aic_w = DMatrix::from_fn(5, 8, |i, j| (i + j) as f64);
        let e: DMatrix<f64> = w.steady_replication();
        let folded = w.fold(&aic, &aic_w);
        assert_eq!(folded, &aic + &aic_w * &e);
    }

    #[test]
    fn wake_image_solves_convection_at_frequency() {
        let w = kernel();
        let z = Complex64::from_polar(1.0, 0.3);
        let cw = w.at_frequency(z).to_dense();
        let cg = cpx(&w.cgamma::<DMatrix<f64>>());
        let cgw = cpx(&w.cgamma_w::<DMatrix<f64>>());
        // z Cw = Cg + CgW Cw
        let lhs = &cw * z;
        let rhs = &cg + &cgw * &cw;
        assert!((lhs - rhs).camax() < 1e-14);
    }

    #[test]
    fn sparse_products_match_dense() {
        let w = kernel();
        let z = Complex64::from_polar(1.0, 1.1);
        let cwz = w.at_frequency(z);
        let dense = cwz.to_dense();
        let x = DMatrix::from_fn(5, 2, |i, j| Complex64::new(i as f64, j as f64 - 0.5));
        assert!((cwz.apply(&x) - &dense * &x).camax() < 1e-14);
        let y = DMatrix::from_fn(8, 3, |i, j| Complex64::new(j as f64, 1.0 + i as f64));
        assert!((cwz.adjoint_apply(&y) - dense.adjoint() * &y).camax() < 1e-13);
        let l = DMatrix::from_fn(4, 8, |i, j| (i * j) as f64 - 2.0);
        assert!((cwz.premul_real(&l) - cpx(&l) * &dense).camax() < 1e-13);
    }

    #[test]
    fn transpose_shift_solve() {
        let w = kernel();
        let s = Complex64::from_polar(1.0, -0.7);
        let r = DMatrix::from_fn(8, 2, |i, j| Complex64::new(1.0 + i as f64, j as f64));
        let q = w.solve_shift_transpose(s, &r);
        let cgw_t = cpx(&w.cgamma_w::<DMatrix<f64>>()).transpose();
        let lhs = DMatrix::<Complex64>::identity(8, 8) * s - cgw_t;
        assert!((lhs * q - r).camax() < 1e-12);
    }
}
