//! Frequency-domain model built straight on the influence matrices.
//!
//! No state-transition matrix is formed: each frequency solves
//! `(A0 + A0W Cw(z)) Gamma = B u` with `A0`, `A0W` borrowed from the steady
//! assembly. Supports exact differentiation (`IntegrationOrder::Exact`).

use nalgebra::DMatrix;
use vx_core::MatrixLike;
use vx_core::timing::{CpuSummary, Timer};
use vx_solver::SteadyAssembly;

use crate::error::{SimError, SimResult};
use crate::freq::{CirculationKernel, CirculationSystem, FrequencyResponse};
use crate::settings::{FrequencySettings, ScalingFactors};
use crate::variables::{FORCES, U_GUST, VariableMap, ZETA, ZETA_DOT};

/// Which side of the model a gain is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainSide {
    /// `u = K v`: B and D are post-multiplied.
    In,
    /// `z = K y`: C and D are pre-multiplied.
    Out,
}

#[derive(Clone, Debug)]
pub struct FrequencyModel<'a> {
    steady: &'a SteadyAssembly,
    settings: FrequencySettings,
    /// Right-hand side of the bound system (K x Nu).
    b: DMatrix<f64>,
    /// Output map over `[Gamma, Gamma_w, delta]`.
    c: DMatrix<f64>,
    d: DMatrix<f64>,
    dt: f64,
    inputs: VariableMap,
    outputs: VariableMap,
    scaling: ScalingFactors,
    scaled: bool,
    gained: bool,
    cpu: CpuSummary,
}

impl<'a> FrequencyModel<'a> {
    pub fn assemble(steady: &'a SteadyAssembly, settings: FrequencySettings) -> SimResult<Self> {
        settings.validate()?;
        let scaling = settings.scaling.factors()?;
        let timer = Timer::start("frequency assembly");

        let (k, k_star) = (steady.k(), steady.k_star());
        let nz = steady.sizes.n_vertex_dofs();
        let (nu, ny) = (3 * nz, nz);

        let mut b = DMatrix::zeros(k, nu);
        b.view_mut((0, 0), (k, nz)).copy_from(&(-&steady.ducdzeta));
        b.view_mut((0, nz), (k, nz)).copy_from(&steady.ducdu_ext);
        b.view_mut((0, 2 * nz), (k, nz)).copy_from(&(-&steady.ducdu_ext));

        let mut c = DMatrix::zeros(ny, 2 * k + k_star);
        c.view_mut((0, 0), (ny, k)).copy_from(&steady.dfqsdgamma);
        c.view_mut((0, k), (ny, k_star)).copy_from(&steady.dfqsdgamma_star);
        c.view_mut((0, k + k_star), (ny, k))
            .copy_from(&(&steady.dfunstdgamma_dot / settings.dt));

        let mut d = DMatrix::zeros(ny, nu);
        d.view_mut((0, 0), (ny, nz)).copy_from(&steady.dfqsdzeta);
        d.view_mut((0, nz), (ny, nz)).copy_from(&(-&steady.dfqsdu_ext));
        d.view_mut((0, 2 * nz), (ny, nz)).copy_from(&steady.dfqsdu_ext);

        let cpu = CpuSummary {
            assemble: timer.stop_and_log(),
            ..CpuSummary::default()
        };
        cpu.log("frequency model");
        tracing::info!(k, k_star, nu, ny, order = u8::from(settings.integration_order), "frequency model assembled");

        Ok(Self {
            steady,
            settings,
            b,
            c,
            d,
            dt: settings.dt,
            inputs: VariableMap::new()
                .with(ZETA, nz)
                .with(ZETA_DOT, nz)
                .with(U_GUST, nz),
            outputs: VariableMap::new().with(FORCES, ny),
            scaling,
            scaled: false,
            gained: false,
            cpu,
        })
    }

    pub fn settings(&self) -> &FrequencySettings {
        &self.settings
    }

    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }

    pub fn d(&self) -> &DMatrix<f64> {
        &self.d
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn inputs(&self) -> &VariableMap {
        &self.inputs
    }

    pub fn outputs(&self) -> &VariableMap {
        &self.outputs
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    pub fn cpu(&self) -> &CpuSummary {
        &self.cpu
    }

    /// Scale B, C, D and dt. Must precede any gain.
    pub fn nondimss(&mut self) -> SimResult<()> {
        if self.scaled {
            return Err(SimError::config("model is already non-dimensional"));
        }
        let timer = Timer::start("nondimss");
        self.apply_scaling(false)?;
        self.scaled = true;
        self.cpu.nondim = timer.stop_and_log();
        self.cpu.log("frequency model");
        Ok(())
    }

    pub fn dimss(&mut self) -> SimResult<()> {
        if !self.scaled {
            return Err(SimError::config("model is already dimensional"));
        }
        let timer = Timer::start("dimss");
        self.apply_scaling(true)?;
        self.scaled = false;
        self.cpu.dim = timer.stop_and_log();
        self.cpu.log("frequency model");
        Ok(())
    }

    fn apply_scaling(&mut self, inverse: bool) -> SimResult<()> {
        if self.gained {
            return Err(SimError::config("scaling must be applied before gains"));
        }
        let f = self.scaling;
        let factor = |x: f64| if inverse { 1.0 / x } else { x };
        for var in self.inputs.iter() {
            let reference = if var.name == ZETA { f.length } else { f.speed };
            MatrixLike::scale_columns(&mut self.b, var.range.clone(), factor(reference / f.circulation));
            MatrixLike::scale_columns(&mut self.d, var.range.clone(), factor(reference / f.force));
        }
        self.c *= factor(f.circulation / f.force);
        self.dt *= factor(1.0 / f.time);
        Ok(())
    }

    /// Attach a constant gain to the inputs or outputs.
    pub fn add_gain(&mut self, gain: &DMatrix<f64>, side: GainSide) -> SimResult<()> {
        match side {
            GainSide::In => {
                if gain.nrows() != self.b.ncols() {
                    return Err(SimError::Dimension {
                        what: "input gain".into(),
                        expected: (self.b.ncols(), gain.ncols()),
                        actual: gain.shape(),
                    });
                }
                self.b = &self.b * gain;
                self.d = &self.d * gain;
                self.inputs = VariableMap::new().with("input", gain.ncols());
            }
            GainSide::Out => {
                if gain.ncols() != self.c.nrows() {
                    return Err(SimError::Dimension {
                        what: "output gain".into(),
                        expected: (gain.nrows(), self.c.nrows()),
                        actual: gain.shape(),
                    });
                }
                self.c = gain * &self.c;
                self.d = gain * &self.d;
                self.outputs = VariableMap::new().with("output", gain.nrows());
            }
        }
        self.gained = true;
        Ok(())
    }

    fn circulation_system(&self) -> CirculationSystem<'a> {
        let steady: &'a SteadyAssembly = self.steady;
        let (k, k_star) = (steady.k(), steady.k_star());
        CirculationSystem {
            order: self.settings.integration_order,
            dt: self.dt,
            wake: &steady.wake,
            kernel: CirculationKernel::Influence {
                aic: &steady.aic,
                aic_wake: &steady.aic_wake,
            },
            b_bound: self.b.clone(),
            c_gamma: self.c.columns(0, k).into_owned(),
            c_star: self.c.columns(k, k_star).into_owned(),
            c_delta: self.c.columns(k + k_star, k).into_owned(),
            c_lag: None,
            d: self.d.clone(),
        }
    }

    /// Transfer function at the given angular frequencies.
    pub fn freqresp(&self, frequencies: &[f64]) -> SimResult<FrequencyResponse> {
        let timer = Timer::start("frequency model response");
        let out = self.circulation_system().freqresp(frequencies)?;
        let elapsed = timer.stop_and_log();
        tracing::info!(n_freq = frequencies.len(), elapsed_s = elapsed, "frequency response done");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use vx_lattice::{LatticeBuilder, SurfaceGrid, SurrogateInfluence};
    use crate::freq::max_modulus;

    fn steady() -> SteadyAssembly {
        let mut b = LatticeBuilder::new(1.0);
        b.add_surface(
            SurfaceGrid::rectangular("wing", 2, 1, 2, 1.0, 1.0, Vector3::new(5.0, 0.0, 0.0))
                .with_reference_circulation(0.4),
        );
        let lattice = b.build().unwrap();
        SteadyAssembly::assemble(&lattice, &SurrogateInfluence::default()).unwrap()
    }

    #[test]
    fn zero_frequency_matches_steady_solve() {
        let asm = steady();
        let model = FrequencyModel::assemble(&asm, FrequencySettings::default()).unwrap();
        let r = model.freqresp(&[0.0]).unwrap();
        let nz = asm.sizes.n_vertex_dofs();
        let mut input = vx_solver::SteadyInput::zeros(&asm.sizes);
        input.u_ext[2] = 1.0;
        let sol = asm.solve(&input).unwrap();
        for i in 0..nz {
            assert!((r.data[0][(i, 2 * nz + 2)].re - sol.fqs[i]).abs() < 1e-10);
            assert!(r.data[0][(i, 2 * nz + 2)].im.abs() < 1e-12);
        }
    }

    #[test]
    fn gains_compose_with_response() {
        let asm = steady();
        let mut model = FrequencyModel::assemble(&asm, FrequencySettings::default()).unwrap();
        let nz = asm.sizes.n_vertex_dofs();
        let full = model.freqresp(&[1.0]).unwrap();

        let gin = DMatrix::from_fn(3 * nz, 2, |i, j| if i == j * nz + 1 { 1.0 } else { 0.0 });
        let gout = DMatrix::from_fn(1, nz, |_, j| j as f64);
        model.add_gain(&gin, GainSide::In).unwrap();
        model.add_gain(&gout, GainSide::Out).unwrap();
        let reduced = model.freqresp(&[1.0]).unwrap();

        let to_c = |m: &DMatrix<f64>| m.map(|v| num_complex::Complex64::new(v, 0.0));
        let expected = to_c(&gout) * &full.data[0] * to_c(&gin);
        assert!(max_modulus(&(&reduced.data[0] - expected)) < 1e-10);
        assert_eq!(model.inputs().len(), 2);
        assert!(model.nondimss().is_err());
    }

    #[test]
    fn mismatched_gain_is_rejected() {
        let asm = steady();
        let mut model = FrequencyModel::assemble(&asm, FrequencySettings::default()).unwrap();
        let err = model.add_gain(&DMatrix::zeros(2, 2), GainSide::In).unwrap_err();
        assert!(matches!(err, SimError::Dimension { .. }));
    }
}
