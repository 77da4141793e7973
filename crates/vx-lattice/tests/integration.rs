use nalgebra::Vector3;
use vx_lattice::{InfluenceProvider, LatticeBuilder, LatticeError, SurfaceGrid, SurrogateInfluence};

fn wing() -> SurfaceGrid {
    SurfaceGrid::rectangular("wing", 4, 2, 10, 1.0, 4.0, Vector3::new(10.0, 0.0, 0.0))
}

#[test]
fn empty_lattice_is_rejected() {
    let err = LatticeBuilder::new(1.225).build().unwrap_err();
    assert_eq!(err, LatticeError::EmptyLattice);
}

#[test]
fn density_must_be_positive() {
    for rho in [0.0, -1.0, f64::NAN] {
        let mut b = LatticeBuilder::new(rho);
        b.add_surface(wing());
        assert!(matches!(b.build(), Err(LatticeError::InvalidDensity { .. })));
    }
}

#[test]
fn mismatched_arrays_are_reported() {
    let mut s = wing();
    s.zeta_dot.pop();
    let mut b = LatticeBuilder::new(1.225);
    b.add_surface(s);
    match b.build() {
        Err(LatticeError::DimensionMismatch {
            what,
            expected,
            actual,
        }) => {
            assert_eq!(what, "wing.zeta_dot");
            assert_eq!((expected, actual), (15, 14));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn wakeless_surface_is_rejected() {
    let s = SurfaceGrid::rectangular("stub", 2, 2, 0, 1.0, 1.0, Vector3::zeros());
    let mut b = LatticeBuilder::new(1.0);
    b.add_surface(s);
    assert!(matches!(b.build(), Err(LatticeError::InvalidDims { .. })));
}

#[test]
fn non_finite_velocity_is_rejected() {
    let mut s = wing();
    s.u_ext[3].y = f64::INFINITY;
    let mut b = LatticeBuilder::new(1.0);
    b.add_surface(s);
    let err = b.build().unwrap_err();
    assert!(format!("{err}").contains("non-finite u_ext"));
}

#[test]
fn two_surface_sizes_and_provider_blocks() {
    let mut b = LatticeBuilder::new(1.225);
    let w = b.add_surface(wing());
    let t = b.add_surface(SurfaceGrid::rectangular(
        "tail",
        2,
        3,
        5,
        0.5,
        1.5,
        Vector3::new(10.0, 0.0, 0.0),
    ));
    let lattice = b.build().unwrap();
    let sizes = lattice.sizes();
    assert_eq!((sizes.k, sizes.k_star, sizes.kzeta), (14, 35, 27));
    assert_eq!(lattice.ids().collect::<Vec<_>>(), vec![w, t]);

    let provider = SurrogateInfluence::default();
    let kernel = provider.wake_propagation(&sizes);
    assert_eq!((kernel.k(), kernel.k_star()), (14, 35));
    let cross = provider.bound_aic(&lattice, t, w).unwrap();
    assert_eq!(cross.shape(), (6, 8));
    assert!(cross.iter().all(|&v| v < 0.0));
}
