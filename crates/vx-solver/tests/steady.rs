use nalgebra::{DMatrix, DVector, Vector3};
use vx_core::SurfaceId;
use vx_lattice::{
    InfluenceProvider, Lattice, LatticeBuilder, LatticeResult, SurfaceGrid, SurrogateInfluence,
};
use vx_solver::{SolverError, SteadyAssembly, SteadyInput};

fn lattice() -> Lattice {
    let u = Vector3::new(10.0, 0.0, 0.5);
    let mut b = LatticeBuilder::new(1.225);
    b.add_surface(
        SurfaceGrid::rectangular("wing", 4, 2, 10, 1.0, 4.0, u).with_reference_circulation(0.8),
    );
    b.add_surface(
        SurfaceGrid::rectangular("tail", 2, 2, 6, 0.5, 1.5, u).with_reference_circulation(0.3),
    );
    b.build().unwrap()
}

fn input(assembly: &SteadyAssembly) -> SteadyInput {
    let n = assembly.sizes.n_vertex_dofs();
    let mut input = SteadyInput::zeros(&assembly.sizes);
    input.zeta = DVector::from_fn(n, |i, _| 1e-2 * ((i % 7) as f64 - 3.0));
    input.zeta_dot = DVector::from_fn(n, |i, _| 0.1 * ((i % 5) as f64 - 2.0));
    input.u_ext = DVector::from_fn(n, |i, _| if i % 3 == 0 { 0.5 } else { -0.2 });
    input
}

#[test]
fn solution_satisfies_folded_system() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let u = input(&asm);
    let sol = asm.solve(&u).unwrap();

    let bv = &asm.ducdu_ext * (&u.u_ext - &u.zeta_dot) + &asm.ducdzeta * &u.zeta;
    let residual = &asm.aic_folded * &sol.gamma + bv;
    assert!(residual.amax() < 1e-12);

    // folded system equals bound + wake with replicated wake circulation
    let unfolded = &asm.aic * &sol.gamma + &asm.aic_wake * &sol.gamma_star;
    assert!((unfolded - &asm.aic_folded * &sol.gamma).amax() < 1e-12);
}

#[test]
fn wake_is_replicated_trailing_edge() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let sol = asm.solve(&input(&asm)).unwrap();
    let wing = SurfaceId::from_index(0);
    let te = asm.sizes.trailing_edge(wing);
    for mm in 0..10 {
        for nn in 0..2 {
            let w = asm.sizes.wake_panel(wing, mm, nn);
            assert_eq!(sol.gamma_star[w], sol.gamma[te.start + nn]);
        }
    }
}

#[test]
fn solve_is_linear_in_input() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let u = input(&asm);
    let s1 = asm.solve(&u).unwrap();
    let scaled = SteadyInput {
        zeta: &u.zeta * 2.0,
        zeta_dot: &u.zeta_dot * 2.0,
        u_ext: &u.u_ext * 2.0,
    };
    let s2 = asm.solve(&scaled).unwrap();
    assert!((&s2.gamma - &s1.gamma * 2.0).amax() < 1e-12);
    assert!((&s2.fqs - &s1.fqs * 2.0).amax() < 1e-10);

    let zero = asm.solve(&SteadyInput::zeros(&asm.sizes)).unwrap();
    assert_eq!(zero.gamma.amax(), 0.0);
    assert_eq!(zero.fqs.amax(), 0.0);
}

#[test]
fn force_gains_match_total_forces() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let sol = asm.solve(&input(&asm)).unwrap();
    let pole = Vector3::new(0.25, 0.0, 0.0);
    let (ftot, mtot) = asm.total_forces(&sol.fqs, pole);
    let gains = asm.force_gains(pole);
    let f = &gains.kftot * &sol.fqs;
    let m = &gains.kmtot * &sol.fqs;
    for c in 0..3 {
        assert!((f[c] - ftot[c]).abs() < 1e-10);
        assert!((m[c] - mtot[c]).abs() < 1e-10);
    }
    let sec = asm.sectional_gains();
    assert_eq!(sec.kfsec.nrows(), 3 * (3 + 3));
    let fsec = &sec.kfsec * &sol.fqs;
    let lift_from_sections: f64 = fsec.rows(6, 3).sum() + fsec.rows(9 + 6, 3).sum();
    assert!((lift_from_sections - ftot.z).abs() < 1e-10);
}

#[test]
fn reshape_gives_surface_grids() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let sol = asm.solve(&input(&asm)).unwrap();
    let grids = sol.reshape(&asm.sizes);
    assert_eq!(grids.len(), 2);
    assert_eq!(grids[0].gamma.shape(), (4, 2));
    assert_eq!(grids[1].forces[2].shape(), (3, 3));
    assert_eq!(grids[0].gamma[(3, 1)], sol.gamma[7]);
    let tail_fz_00 = sol.fqs[45 + 2 * 9];
    assert_eq!(grids[1].forces[2][(0, 0)], tail_fz_00);
}

#[test]
fn wrong_input_length_is_a_dimension_error() {
    let lat = lattice();
    let asm = SteadyAssembly::assemble(&lat, &SurrogateInfluence::default()).unwrap();
    let mut u = SteadyInput::zeros(&asm.sizes);
    u.u_ext = DVector::zeros(3);
    assert!(matches!(asm.solve(&u), Err(SolverError::Dimension { .. })));
}

/// Surrogate with a configurable defect.
struct Broken {
    inner: SurrogateInfluence,
    zero_aic: bool,
    short_wnv: bool,
}

impl InfluenceProvider for Broken {
    fn bound_aic(&self, l: &Lattice, t: SurfaceId, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        let aic = self.inner.bound_aic(l, t, s)?;
        Ok(if self.zero_aic { aic * 0.0 } else { aic })
    }
    fn wake_aic(&self, l: &Lattice, t: SurfaceId, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        let aic = self.inner.wake_aic(l, t, s)?;
        Ok(if self.zero_aic { aic * 0.0 } else { aic })
    }
    fn normal_velocity_zeta(
        &self,
        l: &Lattice,
        t: SurfaceId,
        s: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        self.inner.normal_velocity_zeta(l, t, s)
    }
    fn normal_velocity_input(&self, l: &Lattice, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        let wnv = self.inner.normal_velocity_input(l, s)?;
        Ok(if self.short_wnv {
            wnv.remove_row(0)
        } else {
            wnv
        })
    }
    fn force_zeta_vrel0(&self, l: &Lattice, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        self.inner.force_zeta_vrel0(l, s)
    }
    fn force_induced_zeta(
        &self,
        l: &Lattice,
        t: SurfaceId,
        s: SurfaceId,
    ) -> LatticeResult<DMatrix<f64>> {
        self.inner.force_induced_zeta(l, t, s)
    }
    fn force_input(&self, l: &Lattice, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        self.inner.force_input(l, s)
    }
    fn force_gamma_vrel0(
        &self,
        l: &Lattice,
        s: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)> {
        self.inner.force_gamma_vrel0(l, s)
    }
    fn force_induced_gamma(
        &self,
        l: &Lattice,
        t: SurfaceId,
        s: SurfaceId,
    ) -> LatticeResult<(DMatrix<f64>, DMatrix<f64>)> {
        self.inner.force_induced_gamma(l, t, s)
    }
    fn force_gamma_dot(&self, l: &Lattice, s: SurfaceId) -> LatticeResult<DMatrix<f64>> {
        self.inner.force_gamma_dot(l, s)
    }
}

#[test]
fn singular_influence_matrix_is_fatal() {
    let lat = lattice();
    let provider = Broken {
        inner: SurrogateInfluence::default(),
        zero_aic: true,
        short_wnv: false,
    };
    let asm = SteadyAssembly::assemble(&lat, &provider).unwrap();
    let err = asm.solve(&input(&asm)).unwrap_err();
    assert!(matches!(err, SolverError::NumericalSingularity { .. }));
    assert!(err.to_string().contains("steady influence matrix"));
}

#[test]
fn provider_shape_errors_are_reported() {
    let lat = lattice();
    let provider = Broken {
        inner: SurrogateInfluence::default(),
        zero_aic: false,
        short_wnv: true,
    };
    match SteadyAssembly::assemble(&lat, &provider) {
        Err(SolverError::Dimension {
            what,
            expected,
            actual,
        }) => {
            assert_eq!(what, "normal velocity / input");
            assert_eq!(expected, (8, 45));
            assert_eq!(actual, (7, 45));
        }
        other => panic!("unexpected: {other:?}"),
    }
}
