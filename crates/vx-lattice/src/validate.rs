//! Lattice validation logic.

use nalgebra::Vector3;

use crate::error::{LatticeError, LatticeResult};
use crate::surface::SurfaceGrid;

pub(crate) fn validate_density(density: f64) -> LatticeResult<()> {
    if density.is_finite() && density > 0.0 {
        Ok(())
    } else {
        Err(LatticeError::InvalidDensity { value: density })
    }
}

pub(crate) fn validate_surfaces(surfaces: &[SurfaceGrid]) -> LatticeResult<()> {
    if surfaces.is_empty() {
        return Err(LatticeError::EmptyLattice);
    }
    for surface in surfaces {
        validate_surface(surface)?;
    }
    Ok(())
}

fn validate_surface(s: &SurfaceGrid) -> LatticeResult<()> {
    let invalid = |what| LatticeError::InvalidDims {
        surface: s.name.clone(),
        what,
    };
    if s.m == 0 {
        return Err(invalid("no chordwise panels"));
    }
    if s.n == 0 {
        return Err(invalid("no spanwise panels"));
    }
    if s.m_star == 0 {
        return Err(invalid("no wake panels"));
    }

    check_len(s, "zeta", s.zeta.len(), s.kzeta())?;
    check_len(s, "zeta_dot", s.zeta_dot.len(), s.kzeta())?;
    check_len(s, "u_ext", s.u_ext.len(), s.kzeta())?;
    check_len(s, "forces", s.forces.len(), s.kzeta())?;
    check_len(s, "zeta_star", s.zeta_star.len(), s.kzeta_star())?;
    check_len(s, "gamma", s.gamma.len(), s.k())?;
    check_len(s, "gamma_star", s.gamma_star.len(), s.k_star())?;

    check_finite(s, "zeta", &s.zeta)?;
    check_finite(s, "zeta_dot", &s.zeta_dot)?;
    check_finite(s, "u_ext", &s.u_ext)?;
    check_finite(s, "zeta_star", &s.zeta_star)?;
    check_finite(s, "forces", &s.forces)?;
    if s.gamma.iter().chain(&s.gamma_star).any(|g| !g.is_finite()) {
        return Err(LatticeError::NonFinite {
            surface: s.name.clone(),
            what: "circulation",
        });
    }
    Ok(())
}

fn check_len(s: &SurfaceGrid, what: &str, actual: usize, expected: usize) -> LatticeResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(LatticeError::DimensionMismatch {
            what: format!("{}.{}", s.name, what),
            expected,
            actual,
        })
    }
}

fn check_finite(s: &SurfaceGrid, what: &'static str, values: &[Vector3<f64>]) -> LatticeResult<()> {
    if values.iter().all(|v| v.iter().all(|x| x.is_finite())) {
        Ok(())
    } else {
        Err(LatticeError::NonFinite {
            surface: s.name.clone(),
            what,
        })
    }
}
