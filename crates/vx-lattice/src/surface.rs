//! Single aerodynamic surface at the linearization point.

use nalgebra::Vector3;

/// Bound and wake grid of one lifting surface.
///
/// Vertex arrays are stored row-major over `(chordwise, spanwise)`:
/// vertex `(mm, nn)` lives at `mm * (n + 1) + nn`. Panel `(mm, nn)` is
/// bounded by vertices `(mm, nn)`, `(mm, nn + 1)`, `(mm + 1, nn + 1)`,
/// `(mm + 1, nn)`; chordwise index 0 is the leading edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    pub name: String,
    /// Chordwise bound panels.
    pub m: usize,
    /// Spanwise panels (shared by bound and wake grids).
    pub n: usize,
    /// Chordwise wake panels.
    pub m_star: usize,
    pub zeta: Vec<Vector3<f64>>,
    pub zeta_dot: Vec<Vector3<f64>>,
    pub u_ext: Vec<Vector3<f64>>,
    pub zeta_star: Vec<Vector3<f64>>,
    /// Reference bound circulation, `m * n`, row-major.
    pub gamma: Vec<f64>,
    /// Reference wake circulation, `m_star * n`, row-major.
    pub gamma_star: Vec<f64>,
    /// Steady reference force at each bound vertex.
    pub forces: Vec<Vector3<f64>>,
}

impl SurfaceGrid {
    /// Flat rectangular surface in the x-y plane with a straight wake.
    ///
    /// The leading edge sits on `x = 0`, the span is centred on `y = 0` and
    /// wake panels keep the bound chordwise panel length. Every vertex sees
    /// the external velocity `u_inf`; reference circulation and forces are zero.
    pub fn rectangular(
        name: impl Into<String>,
        m: usize,
        n: usize,
        m_star: usize,
        chord: f64,
        span: f64,
        u_inf: Vector3<f64>,
    ) -> Self {
        let dx = chord / m.max(1) as f64;
        let dy = span / n.max(1) as f64;
        let y0 = -0.5 * span;

        let grid = |rows: usize, x0: f64| -> Vec<Vector3<f64>> {
            let mut out = Vec::with_capacity((rows + 1) * (n + 1));
            for mm in 0..=rows {
                for nn in 0..=n {
                    out.push(Vector3::new(x0 + mm as f64 * dx, y0 + nn as f64 * dy, 0.0));
                }
            }
            out
        };

        let kzeta = (m + 1) * (n + 1);
        Self {
            name: name.into(),
            m,
            n,
            m_star,
            zeta: grid(m, 0.0),
            zeta_dot: vec![Vector3::zeros(); kzeta],
            u_ext: vec![u_inf; kzeta],
            zeta_star: grid(m_star, chord),
            gamma: vec![0.0; m * n],
            gamma_star: vec![0.0; m_star * n],
            forces: vec![Vector3::zeros(); kzeta],
        }
    }

    /// Set a uniform reference circulation on bound and wake panels.
    pub fn with_reference_circulation(mut self, gamma: f64) -> Self {
        self.gamma.iter_mut().for_each(|g| *g = gamma);
        self.gamma_star.iter_mut().for_each(|g| *g = gamma);
        self
    }

    /// Set the steady reference vertex forces.
    pub fn with_forces(mut self, forces: Vec<Vector3<f64>>) -> Self {
        self.forces = forces;
        self
    }

    pub fn k(&self) -> usize {
        self.m * self.n
    }

    pub fn k_star(&self) -> usize {
        self.m_star * self.n
    }

    pub fn kzeta(&self) -> usize {
        (self.m + 1) * (self.n + 1)
    }

    pub fn kzeta_star(&self) -> usize {
        (self.m_star + 1) * (self.n + 1)
    }

    #[inline]
    pub fn vertex_index(&self, mm: usize, nn: usize) -> usize {
        mm * (self.n + 1) + nn
    }

    #[inline]
    pub fn panel_index(&self, mm: usize, nn: usize) -> usize {
        mm * self.n + nn
    }

    /// Vertex indices of bound panel `(mm, nn)` in ring order, leading edge first.
    pub fn panel_vertices(&self, mm: usize, nn: usize) -> [usize; 4] {
        [
            self.vertex_index(mm, nn),
            self.vertex_index(mm, nn + 1),
            self.vertex_index(mm + 1, nn + 1),
            self.vertex_index(mm + 1, nn),
        ]
    }

    pub fn collocation(&self, mm: usize, nn: usize) -> Vector3<f64> {
        let v = self.panel_vertices(mm, nn);
        v.iter().map(|&i| self.zeta[i]).sum::<Vector3<f64>>() * 0.25
    }

    pub fn wake_centroid(&self, mm: usize, nn: usize) -> Vector3<f64> {
        let at = |r: usize, c: usize| self.zeta_star[r * (self.n + 1) + c];
        (at(mm, nn) + at(mm, nn + 1) + at(mm + 1, nn + 1) + at(mm + 1, nn)) * 0.25
    }

    /// Unit normal of bound panel `(mm, nn)` from the cross product of its diagonals.
    pub fn panel_normal(&self, mm: usize, nn: usize) -> Vector3<f64> {
        let [a, b, c, d] = self.panel_vertices(mm, nn).map(|i| self.zeta[i]);
        let normal = (c - a).cross(&(b - d));
        let norm = normal.norm();
        if norm > 0.0 {
            normal / norm
        } else {
            Vector3::z()
        }
    }

    pub fn panel_area(&self, mm: usize, nn: usize) -> f64 {
        let [a, b, c, d] = self.panel_vertices(mm, nn).map(|i| self.zeta[i]);
        0.5 * (c - a).cross(&(b - d)).norm()
    }

    /// Chordwise vector across panel `(mm, nn)`, leading-edge midpoint to trailing-edge midpoint.
    pub fn panel_chord(&self, mm: usize, nn: usize) -> Vector3<f64> {
        let [a, b, c, d] = self.panel_vertices(mm, nn).map(|i| self.zeta[i]);
        0.5 * (c + d) - 0.5 * (a + b)
    }

    /// Relative velocity `u_ext - zeta_dot` at a bound vertex.
    pub fn relative_velocity(&self, vertex: usize) -> Vector3<f64> {
        self.u_ext[vertex] - self.zeta_dot[vertex]
    }

    /// Characteristic panel length: chordwise size of the leading-edge root panel.
    pub fn panel_length(&self) -> f64 {
        self.panel_chord(0, 0).norm()
    }
}
