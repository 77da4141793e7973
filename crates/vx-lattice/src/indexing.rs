//! Surface size record and contiguous indexing.
//!
//! Maps per-surface panel, wake-panel and vertex-DOF indices onto the
//! global vectors used by the solvers.

use std::ops::Range;

use vx_core::SurfaceId;

use crate::lattice::Lattice;

/// Counts and offsets of one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSizes {
    pub m: usize,
    pub n: usize,
    pub m_star: usize,
    pub k: usize,
    pub k_star: usize,
    pub kzeta: usize,
    pub kzeta_star: usize,
    /// First bound panel in the global circulation vector.
    pub k_offset: usize,
    /// First wake panel in the global wake vector.
    pub k_star_offset: usize,
    /// First bound vertex; the DOF offset is `3 * kzeta_offset`.
    pub kzeta_offset: usize,
}

/// Per-surface and total sizes of a lattice.
///
/// Every assembled block derives its dimensions from this record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRecord {
    surfaces: Vec<SurfaceSizes>,
    pub k: usize,
    pub k_star: usize,
    pub kzeta: usize,
    pub kzeta_star: usize,
}

impl SizeRecord {
    pub fn from_lattice(lattice: &Lattice) -> Self {
        Self::from_dims(
            lattice
                .surfaces()
                .iter()
                .map(|s| (s.m, s.n, s.m_star)),
        )
    }

    /// Build from `(m, n, m_star)` per surface.
    pub fn from_dims(dims: impl IntoIterator<Item = (usize, usize, usize)>) -> Self {
        let mut surfaces = Vec::new();
        let (mut k, mut k_star, mut kzeta, mut kzeta_star) = (0, 0, 0, 0);
        for (m, n, m_star) in dims {
            let sizes = SurfaceSizes {
                m,
                n,
                m_star,
                k: m * n,
                k_star: m_star * n,
                kzeta: (m + 1) * (n + 1),
                kzeta_star: (m_star + 1) * (n + 1),
                k_offset: k,
                k_star_offset: k_star,
                kzeta_offset: kzeta,
            };
            k += sizes.k;
            k_star += sizes.k_star;
            kzeta += sizes.kzeta;
            kzeta_star += sizes.kzeta_star;
            surfaces.push(sizes);
        }
        Self {
            surfaces,
            k,
            k_star,
            kzeta,
            kzeta_star,
        }
    }

    pub fn surfaces(&self) -> &[SurfaceSizes] {
        &self.surfaces
    }

    pub fn n_surf(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface(&self, id: SurfaceId) -> &SurfaceSizes {
        &self.surfaces[id.slot()]
    }

    /// Length of a vertex vector (positions, velocities or forces).
    pub fn n_vertex_dofs(&self) -> usize {
        3 * self.kzeta
    }

    /// Total spanwise sections, `sum(n + 1)`.
    pub fn n_sections(&self) -> usize {
        self.surfaces.iter().map(|s| s.n + 1).sum()
    }

    pub fn panel_range(&self, id: SurfaceId) -> Range<usize> {
        let s = self.surface(id);
        s.k_offset..s.k_offset + s.k
    }

    pub fn wake_range(&self, id: SurfaceId) -> Range<usize> {
        let s = self.surface(id);
        s.k_star_offset..s.k_star_offset + s.k_star
    }

    /// Slice of the global vertex vector owned by a surface.
    pub fn vertex_range(&self, id: SurfaceId) -> Range<usize> {
        let s = self.surface(id);
        3 * s.kzeta_offset..3 * (s.kzeta_offset + s.kzeta)
    }

    /// Trailing-edge bound panels (last chordwise row) of a surface.
    pub fn trailing_edge(&self, id: SurfaceId) -> Range<usize> {
        let s = self.surface(id);
        let start = s.k_offset + s.n * (s.m - 1);
        start..start + s.n
    }

    pub fn panel(&self, id: SurfaceId, mm: usize, nn: usize) -> usize {
        let s = self.surface(id);
        s.k_offset + mm * s.n + nn
    }

    pub fn wake_panel(&self, id: SurfaceId, mm: usize, nn: usize) -> usize {
        let s = self.surface(id);
        s.k_star_offset + mm * s.n + nn
    }

    /// Global DOF of component `c` at vertex `(mm, nn)`.
    pub fn vertex_dof(&self, id: SurfaceId, c: usize, mm: usize, nn: usize) -> usize {
        let s = self.surface(id);
        3 * s.kzeta_offset + c * s.kzeta + mm * (s.n + 1) + nn
    }

    /// The three DOFs of a vertex given by its local index `mm * (n + 1) + nn`.
    pub fn vertex_dofs(&self, id: SurfaceId, vertex: usize) -> [usize; 3] {
        let s = self.surface(id);
        let base = 3 * s.kzeta_offset + vertex;
        [base, base + s.kzeta, base + 2 * s.kzeta]
    }
}
