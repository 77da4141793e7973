use nalgebra::{DMatrix, Vector3};
use vx_core::SparseMatrix;
use vx_lattice::{LatticeBuilder, SurfaceGrid, SurrogateInfluence};
use vx_rom::{BalancedModel, BalancingSettings, RomError, balfreq};
use vx_sim::{DynamicModel, DynamicSettings, FrequencyResponse, IntegrationOrder};
use vx_solver::SteadyAssembly;

const DT: f64 = 0.05;

fn small_wing() -> SteadyAssembly {
    let u = Vector3::new(10.0, 0.0, 0.3);
    let mut b = LatticeBuilder::new(1.225);
    b.add_surface(
        SurfaceGrid::rectangular("wing", 2, 2, 4, 1.0, 2.0, u).with_reference_circulation(0.5),
    );
    let lattice = b.build().unwrap();
    SteadyAssembly::assemble(&lattice, &SurrogateInfluence::default()).unwrap()
}

fn dynamic_settings(remove_predictor: bool) -> DynamicSettings {
    DynamicSettings {
        dt: DT,
        integration_order: IntegrationOrder::Second,
        remove_predictor,
        ..DynamicSettings::default()
    }
}

fn balancing() -> BalancingSettings {
    BalancingSettings::split_nyquist(DT, 0.3, 30, 30).unwrap()
}

fn balanced(asm: &SteadyAssembly) -> (DynamicModel<'_>, BalancedModel) {
    let model: DynamicModel = DynamicModel::assemble(asm, dynamic_settings(false)).unwrap();
    let bal = balfreq(&model, &balancing()).unwrap();
    (model, bal)
}

fn max_diff(a: &FrequencyResponse, b: &FrequencyResponse) -> f64 {
    a.max_abs_diff(b).unwrap()
}

#[test]
fn singular_values_are_sorted_and_positive() {
    let asm = small_wing();
    let (model, bal) = balanced(&asm);
    let nx = model.state_space().n_states();
    assert!(bal.order() >= 1 && bal.order() <= nx);
    assert!(bal.gv.iter().all(|&g| g > 0.0));
    assert!(bal.gv.as_slice().windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(bal.t.shape(), (nx, bal.order()));
    assert_eq!(bal.ti.shape(), (bal.order(), nx));
    assert_eq!(bal.ss.n_inputs(), model.state_space().n_inputs());
    assert_eq!(bal.ss.n_outputs(), model.state_space().n_outputs());
}

#[test]
fn projection_is_biorthogonal() {
    let asm = small_wing();
    let (_, bal) = balanced(&asm);
    let rom = bal.truncate_to(1e-7).unwrap();
    let r = rom.order();
    let err = (&rom.ti * &rom.t - DMatrix::<f64>::identity(r, r)).amax();
    assert!(err < 1e-6, "Ti T - I = {err}");
}

#[test]
fn reduced_model_tracks_low_band() {
    let asm = small_wing();
    let (model, bal) = balanced(&asm);
    let w = &balancing().low.frequencies;
    let full = model.freqresp(w).unwrap();
    let scale = full.max_abs();

    let fine = bal.truncate_to(1e-7).unwrap();
    let err = max_diff(&fine.freqresp(w).unwrap(), &full);
    assert!(err < 1e-4 * scale, "fine truncation error {err} vs {scale}");

    let order = (bal.order() / 2).max(1);
    let coarse = bal.truncate(order).unwrap();
    let err = max_diff(&coarse.freqresp(w).unwrap(), &full);
    let bound = 20.0 * bal.discarded(order) + 1e-9 * scale;
    assert!(err <= bound, "order {order}: error {err} above {bound}");
}

#[test]
fn sparse_storage_gives_same_singular_values() {
    let asm = small_wing();
    let (_, dense) = balanced(&asm);
    let model: DynamicModel<SparseMatrix> =
        DynamicModel::assemble(&asm, dynamic_settings(false)).unwrap();
    let sparse = balfreq(&model, &balancing()).unwrap();
    let n = dense.order().min(sparse.order()).min(6);
    for i in 0..n {
        let rel = (dense.gv[i] - sparse.gv[i]).abs() / dense.gv[0];
        assert!(rel < 1e-8, "gv[{i}] differs by {rel}");
    }
}

#[test]
fn predictor_removed_model_is_rejected() {
    let asm = small_wing();
    let model: DynamicModel = DynamicModel::assemble(&asm, dynamic_settings(true)).unwrap();
    assert!(matches!(
        balfreq(&model, &balancing()),
        Err(RomError::Configuration { .. })
    ));
}

#[test]
fn bad_rank_tolerance_is_rejected() {
    let asm = small_wing();
    let model: DynamicModel = DynamicModel::assemble(&asm, dynamic_settings(false)).unwrap();
    let mut settings = balancing();
    settings.rank_tolerance = 1.0;
    assert!(balfreq(&model, &settings).is_err());
}
