//! Frequency-limited balancing by explicit Gramian integration.
//!
//! Controllability and observability Gramians are integrated in factorised
//! form, `W = Z Z^T`, with one column block per frequency. Both factors come
//! from the bound-circulation kernel `(z I - P - Pw Cw)^-1`; the wake,
//! derivative and lag rows follow algebraically. The controllability factor
//! spans both bands, the observability factor the low band only.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use vx_core::MatrixLike;
use vx_core::timing::Timer;
use vx_sim::{CirculationKernel, DynamicModel, InputTiming, StateSpace};

use crate::balanced::BalancedModel;
use crate::band::BalancingSettings;
use crate::error::{RomError, RomResult};

fn cpx(m: &DMatrix<f64>) -> DMatrix<Complex64> {
    m.map(|v| Complex64::new(v, 0.0))
}

fn re(v: f64) -> Complex64 {
    Complex64::new(v, 0.0)
}

/// `[Re(q), Im(q)] * scale`
fn split_re_im(q: &DMatrix<Complex64>, scale: f64) -> DMatrix<f64> {
    let n = q.ncols();
    let mut out = DMatrix::zeros(q.nrows(), 2 * n);
    out.columns_mut(0, n).copy_from(&q.map(|v| v.re * scale));
    out.columns_mut(n, n).copy_from(&q.map(|v| v.im * scale));
    out
}

/// Square root with at most `nrows` columns and the same `Z Z^T`.
fn compress(blocks: &[DMatrix<f64>], nrows: usize, what: &str) -> RomResult<DMatrix<f64>> {
    let ncols = blocks.iter().map(|b| b.ncols()).sum();
    let mut z = DMatrix::zeros(nrows, ncols);
    let mut col = 0;
    for b in blocks {
        z.columns_mut(col, b.ncols()).copy_from(b);
        col += b.ncols();
    }
    let svd = z.svd(true, false);
    let u = svd.u.ok_or_else(|| RomError::NumericalSingularity {
        solve: format!("{what} factor SVD"),
    })?;
    Ok(u * DMatrix::from_diagonal(&svd.singular_values))
}

/// Balance `model` over the bands in `settings`.
///
/// Returns every numerically significant balanced state with its singular
/// value; choosing the order is left to [`BalancedModel::truncate`].
/// Models with the predictor removed are rejected.
pub fn balfreq<M: MatrixLike>(
    model: &DynamicModel<'_, M>,
    settings: &BalancingSettings,
) -> RomResult<BalancedModel> {
    if model.is_predictor_removed() {
        return Err(RomError::config(
            "frequency-limited balancing requires the model with its predictor term",
        ));
    }
    settings.low.validate()?;
    settings.high.validate()?;
    if !(settings.rank_tolerance >= 0.0 && settings.rank_tolerance < 1.0) {
        return Err(RomError::config("rank tolerance must lie in [0, 1)"));
    }
    let timer = Timer::start("balfreq");

    let sys = model.circulation_system();
    let CirculationKernel::Propagator { p, pw } = &sys.kernel else {
        return Err(RomError::config("balancing needs a discrete-time circulation kernel"));
    };
    let coeffs = sys
        .order
        .coefficients()
        .ok_or_else(|| RomError::config("balancing needs a finite-difference order"))?;
    let ss = model.state_space();
    let (k, k_star) = (sys.k(), sys.wake.k_star());
    let (nx, ny) = (ss.n_states(), ss.n_outputs());
    let (d0, lag0) = (k + k_star, 2 * k + k_star);

    let bup = cpx(&sys.b_bound);
    let cg_t = cpx(&sys.c_gamma.transpose());
    let cs_t = cpx(&sys.c_star.transpose());
    let cd_t = cpx(&sys.c_delta.transpose());
    let cl_t = sys.c_lag.as_ref().map(|c| cpx(&c.transpose()));
    let p_t = cpx(&p.transpose());
    let pw_t = cpx(&pw.transpose());

    let mut zc_blocks = Vec::new();
    let mut zo_blocks = Vec::new();
    for (band, observe) in [(&settings.low, true), (&settings.high, false)] {
        for (w, weight) in band.iter() {
            let point = sys.at(w)?;
            let z = point.z;
            let scale = (weight * sys.dt / PI).sqrt();

            // controllability: (zI - A)^-1 B
            let yg = point.solve(&bup)?;
            let mut qc = DMatrix::zeros(nx, yg.ncols());
            qc.rows_mut(0, k).copy_from(&yg);
            qc.rows_mut(k, k_star).copy_from(&point.cw.apply(&yg));
            qc.rows_mut(d0, k)
                .copy_from(&(&yg * sys.derivative_factor(&point)));
            if cl_t.is_some() {
                qc.rows_mut(lag0, k).copy_from(&(&yg * z.inv()));
            }
            zc_blocks.push(split_re_im(&qc, scale));

            if !observe {
                continue;
            }
            // observability: (z^* I - A^T)^-1 C^T
            let q_delta = &cd_t * z;
            let q_lag = cl_t
                .as_ref()
                .map(|cl| (cl + &q_delta * re(coeffs.bm1)) * z);
            let mut rhs = &cg_t
                + point
                    .cw
                    .adjoint_apply(&(&cs_t + &pw_t * &q_delta * re(coeffs.bp1)))
                + &p_t * &q_delta * re(coeffs.bp1)
                + &q_delta * re(coeffs.b0);
            if let Some(q_lag) = &q_lag {
                rhs += q_lag;
            }
            let q_gamma = point.solve_adjoint(&rhs)?;
            let rhs_w = &cs_t + &pw_t * (&q_gamma + &q_delta * re(coeffs.bp1));
            let q_w = sys.wake.solve_shift_transpose(z.conj(), &rhs_w);

            let mut qo = DMatrix::zeros(nx, ny);
            qo.rows_mut(0, k).copy_from(&q_gamma);
            qo.rows_mut(k, k_star).copy_from(&q_w);
            qo.rows_mut(d0, k).copy_from(&q_delta);
            if let Some(q_lag) = &q_lag {
                qo.rows_mut(lag0, k).copy_from(q_lag);
            }
            zo_blocks.push(split_re_im(&qo, scale));
        }
    }

    let zc = compress(&zc_blocks, nx, "controllability")?;
    let zo = compress(&zo_blocks, nx, "observability")?;
    drop((zc_blocks, zo_blocks));

    let svd = (zo.transpose() * &zc).svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(RomError::NumericalSingularity {
                solve: "balancing SVD".into(),
            });
        }
    };
    let s = svd.singular_values;
    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));
    let s_max = order.first().map_or(0.0, |&i| s[i]);
    if !(s_max > 0.0) {
        return Err(RomError::NumericalSingularity {
            solve: "balancing product (zero Gramians)".into(),
        });
    }
    order.retain(|&i| s[i] > settings.rank_tolerance * s_max);
    let r = order.len();

    let gv = DVector::from_fn(r, |j, _| s[order[j]]);
    let sinv = DMatrix::from_diagonal(&gv.map(|v| v.powf(-0.5)));
    let v_r = DMatrix::from_fn(v_t.ncols(), r, |row, j| v_t[(order[j], row)]);
    let u_r = DMatrix::from_fn(u.nrows(), r, |row, j| u[(row, order[j])]);
    let t = &zc * v_r * &sinv;
    let ti = &sinv * u_r.transpose() * zo.transpose();

    let ab = &ti * ss.a.mul_dense(&t);
    let bb = ss.b.premul_dense(&ti);
    let cb = &ss.c * &t;
    let balanced = StateSpace::new(ab, bb, cb, ss.d.clone(), ss.dt, InputTiming::Next)?;

    let elapsed = timer.stop_and_log();
    tracing::info!(
        n_low = settings.low.len(),
        n_high = settings.high.len(),
        full_order = nx,
        balanced_order = r,
        gv_max = s_max,
        gv_min = gv[r - 1],
        elapsed_s = elapsed,
        "frequency-limited balancing done"
    );

    Ok(BalancedModel {
        ss: balanced,
        t,
        ti,
        gv,
    })
}
