#![allow(dead_code)]

use nalgebra::{DMatrix, DVector, Vector3};
use vx_core::relative_diff;
use vx_lattice::{LatticeBuilder, SurfaceGrid, SurrogateInfluence};
use vx_sim::{DynamicSettings, IntegrationOrder};
use vx_solver::SteadyAssembly;

/// Wing and tail in a slightly inclined free stream.
pub fn two_surfaces() -> SteadyAssembly {
    let u = Vector3::new(10.0, 0.0, 0.5);
    let mut b = LatticeBuilder::new(1.225);
    b.add_surface(
        SurfaceGrid::rectangular("wing", 4, 2, 10, 1.0, 4.0, u).with_reference_circulation(0.8),
    );
    b.add_surface(
        SurfaceGrid::rectangular("tail", 2, 2, 6, 0.5, 1.5, u).with_reference_circulation(0.3),
    );
    let lattice = b.build().unwrap();
    SteadyAssembly::assemble(&lattice, &SurrogateInfluence::default()).unwrap()
}

pub fn settings(order: IntegrationOrder, remove_predictor: bool) -> DynamicSettings {
    DynamicSettings {
        dt: 0.025,
        integration_order: order,
        remove_predictor,
        ..DynamicSettings::default()
    }
}

/// Deterministic, non-trivial input of length `n`.
pub fn input(n: usize, phase: f64) -> DVector<f64> {
    DVector::from_fn(n, |i, _| (0.37 * i as f64 + phase).sin())
}

/// `max |a - b| / max(1, max |b|)`
pub fn rel_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    relative_diff(a, b, 1.0)
}

pub fn rel_diff_vec(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    relative_diff(a, b, 1.0)
}

/// Grid of `n` points from 0 to the Nyquist frequency.
pub fn nyquist_grid(dt: f64, n: usize) -> Vec<f64> {
    let w_max = std::f64::consts::PI / dt;
    (0..n).map(|i| w_max * i as f64 / (n - 1) as f64).collect()
}
