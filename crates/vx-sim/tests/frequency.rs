mod common;

use common::{nyquist_grid, settings, two_surfaces};
use num_complex::Complex64;
use vx_core::SparseMatrix;
use vx_sim::{
    DynamicModel, FrequencyModel, FrequencySettings, IntegrationOrder, ScalingReference,
    max_modulus,
};

fn max_rel(a: &vx_sim::FrequencyResponse, b: &vx_sim::FrequencyResponse) -> f64 {
    a.max_abs_diff(b).unwrap() / b.max_abs().max(1.0)
}

#[test]
fn fast_response_matches_resolvent() {
    let asm = two_surfaces();
    for order in [IntegrationOrder::First, IntegrationOrder::Second] {
        for remove_predictor in [false, true] {
            let model: DynamicModel =
                DynamicModel::assemble(&asm, settings(order, remove_predictor)).unwrap();
            let w = nyquist_grid(model.dt(), 5);
            let fast = model.freqresp(&w).unwrap();
            let reference = model.state_space().freqresp(&w).unwrap();
            assert_eq!(fast.len(), 5);
            assert!(
                max_rel(&fast, &reference) < 1e-10,
                "order {order:?}, remove_predictor {remove_predictor}"
            );
        }
    }
}

#[test]
fn direct_and_removed_models_share_transfer_function() {
    let asm = two_surfaces();
    let direct: DynamicModel =
        DynamicModel::assemble(&asm, settings(IntegrationOrder::Second, false)).unwrap();
    let removed: DynamicModel =
        DynamicModel::assemble(&asm, settings(IntegrationOrder::Second, true)).unwrap();
    let w = nyquist_grid(direct.dt(), 7);
    let a = direct.freqresp(&w).unwrap();
    let b = removed.freqresp(&w).unwrap();
    assert!(max_rel(&b, &a) < 1e-11);
}

#[test]
fn frequency_model_matches_dynamic_model() {
    let asm = two_surfaces();
    for order in [IntegrationOrder::First, IntegrationOrder::Second] {
        let s = settings(order, true);
        let dynamic: DynamicModel = DynamicModel::assemble(&asm, s).unwrap();
        let freq = FrequencyModel::assemble(
            &asm,
            FrequencySettings {
                dt: s.dt,
                integration_order: order,
                scaling: s.scaling,
            },
        )
        .unwrap();
        let w = nyquist_grid(s.dt, 6);
        let a = dynamic.freqresp(&w).unwrap();
        let b = freq.freqresp(&w).unwrap();
        assert!(max_rel(&b, &a) < 1e-10, "order {order:?}");
    }
}

#[test]
fn exact_and_discrete_derivatives_agree_at_low_frequency() {
    let asm = two_surfaces();
    let model = |order| {
        FrequencyModel::assemble(
            &asm,
            FrequencySettings {
                dt: 0.001,
                integration_order: order,
                ..FrequencySettings::default()
            },
        )
        .unwrap()
    };
    let w = [0.0, 0.5];
    let exact = model(IntegrationOrder::Exact).freqresp(&w).unwrap();
    let second = model(IntegrationOrder::Second).freqresp(&w).unwrap();
    // second-order differencing error ~ (w dt)^2 relative to the added-mass term
    assert!(max_rel(&second, &exact) < 1e-5);
    assert_eq!(exact.at(0), second.at(0));
}

#[test]
fn scaled_models_stay_consistent() {
    let asm = two_surfaces();
    let mut s = settings(IntegrationOrder::Second, true);
    s.scaling = ScalingReference {
        length: 0.5,
        speed: 10.0,
        density: 1.225,
    };
    let dimensional: DynamicModel = DynamicModel::assemble(&asm, s).unwrap();
    let mut model = dimensional.clone();
    model.nondimss().unwrap();

    // reduced frequency k = w L / U
    let w = [0.0, 4.0, 40.0];
    let k: Vec<f64> = w.iter().map(|w| w * 0.5 / 10.0).collect();
    let fast = model.freqresp(&k).unwrap();
    let reference = model.state_space().freqresp(&k).unwrap();
    assert!(max_rel(&fast, &reference) < 1e-10);

    // dimensional response recovered from the scaled one, input by input
    let dim = dimensional.freqresp(&w).unwrap();
    let f = model.scaling();
    let nz = asm.sizes.n_vertex_dofs();
    for (scaled, full) in fast.data.iter().zip(&dim.data) {
        for j in 0..3 * nz {
            let reference = if j < nz { f.length } else { f.speed };
            let factor = Complex64::new(f.force / reference, 0.0);
            let col = scaled.column(j) * factor;
            let diff = (col - full.column(j)).iter().fold(0.0, |m: f64, v| m.max(v.norm()));
            assert!(diff < 1e-9 * max_modulus(full).max(1.0));
        }
    }
}

#[test]
fn sparse_model_response_matches_dense() {
    let asm = two_surfaces();
    let s = settings(IntegrationOrder::Second, false);
    let dense: DynamicModel = DynamicModel::assemble(&asm, s).unwrap();
    let sparse: DynamicModel<SparseMatrix> = DynamicModel::assemble(&asm, s).unwrap();
    let w = nyquist_grid(s.dt, 4);
    let a = dense.freqresp(&w).unwrap();
    let b = sparse.freqresp(&w).unwrap();
    assert!(max_rel(&b, &a) < 1e-12);
}
