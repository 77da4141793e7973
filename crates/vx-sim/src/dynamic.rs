//! Discrete-time linear model of the circulation dynamics.
//!
//! State vector `x = [Gamma, Gamma_w, dt * dGamma/dt, Gamma(n-1)]`, the last
//! block only for second-order differencing. Inputs are vertex
//! displacements, vertex velocities and external velocities
//! (`9 Kzeta`); outputs are vertex forces (`3 Kzeta`).

use nalgebra::{DMatrix, DVector};
use vx_core::MatrixLike;
use vx_core::timing::{CpuSummary, Timer};
use vx_solver::{SteadyAssembly, factorize, lu_solve};

use crate::error::{SimError, SimResult};
use crate::freq::{CirculationKernel, CirculationSystem, FrequencyResponse};
use crate::model::DiscreteModel;
use crate::settings::{DynamicSettings, IntegrationOrder, ScalingFactors};
use crate::statespace::{InputTiming, StateSpace};
use crate::variables::{
    DTGAMMA_DOT, FORCES, GAMMA, GAMMA_M1, GAMMA_W, U_GUST, VariableMap, ZETA, ZETA_DOT,
};

const BOUND_AIC: &str = "bound influence matrix";

/// Number of states for a given differencing order.
pub fn state_count(order: IntegrationOrder, k: usize, k_star: usize) -> usize {
    if order.has_lag() {
        3 * k + k_star
    } else {
        2 * k + k_star
    }
}

/// Components of a full-order state vector.
#[derive(Clone, Debug, PartialEq)]
pub struct UnpackedState {
    pub gamma: DVector<f64>,
    pub gamma_star: DVector<f64>,
    /// Circulation rate, `delta / dt`.
    pub gamma_dot: DVector<f64>,
}

/// Linear UVLM around a steady reference, in storage `M` for A and B.
#[derive(Clone, Debug)]
pub struct DynamicModel<'a, M: MatrixLike = DMatrix<f64>> {
    steady: &'a SteadyAssembly,
    settings: DynamicSettings,
    ss: StateSpace<M>,
    b_predictor: Option<M>,
    inputs: VariableMap,
    states: VariableMap,
    outputs: VariableMap,
    scaling: ScalingFactors,
    scaled: bool,
    cpu: CpuSummary,
}

impl<'a, M: MatrixLike> DynamicModel<'a, M> {
    /// Assemble the model from the steady blocks.
    ///
    /// The bound influence matrix is factorized once and reused for the wake
    /// coupling and for the input coupling.
    pub fn assemble(steady: &'a SteadyAssembly, settings: DynamicSettings) -> SimResult<Self> {
        let coeffs = settings.validate()?;
        let scaling = settings.scaling.factors()?;
        let timer = Timer::start("dynamic assembly");

        let order = settings.integration_order;
        let (k, k_star) = (steady.k(), steady.k_star());
        let nz = steady.sizes.n_vertex_dofs();
        let nx = state_count(order, k, k_star);
        let (nu, ny) = (3 * nz, nz);
        // first row of the derivative block
        let d0 = k + k_star;

        let lu = factorize(steady.aic.clone(), BOUND_AIC)?;

        let mut a = M::zeros(nx, nx);
        {
            let ainv_aw = lu_solve(&lu, &steady.aic_wake, BOUND_AIC)?;
            let cg: M = steady.wake.cgamma();
            let cgw: M = steady.wake.cgamma_w();
            let p = -cg.premul_dense(&ainv_aw);
            let pw = -cgw.premul_dense(&ainv_aw);

            a.add_block(0, 0, &p);
            a.add_block(0, k, &pw);
            a.add_block_from(k, 0, &cg, 1.0);
            a.add_block_from(k, k, &cgw, 1.0);

            a.add_block(d0, 0, &(&p * coeffs.bp1));
            a.add_diagonal(d0, 0, k, coeffs.b0);
            a.add_block(d0, k, &(&pw * coeffs.bp1));
            if order.has_lag() {
                a.add_diagonal(d0, d0 + k, k, coeffs.bm1);
                a.add_diagonal(d0 + k, 0, k, 1.0);
            }
        }

        let mut b = M::zeros(nx, nu);
        {
            // vertex and external velocities only enter through their difference
            let mut rhs = DMatrix::zeros(k, nu);
            rhs.view_mut((0, 0), (k, nz)).copy_from(&(-&steady.ducdzeta));
            rhs.view_mut((0, nz), (k, nz)).copy_from(&steady.ducdu_ext);
            rhs.view_mut((0, 2 * nz), (k, nz)).copy_from(&(-&steady.ducdu_ext));
            let bup = lu_solve(&lu, &rhs, BOUND_AIC)?;
            b.add_block(0, 0, &bup);
            b.add_block(d0, 0, &(&bup * coeffs.bp1));
        }
        drop(lu);

        let mut c = DMatrix::zeros(ny, nx);
        c.view_mut((0, 0), (ny, k)).copy_from(&steady.dfqsdgamma);
        c.view_mut((0, k), (ny, k_star)).copy_from(&steady.dfqsdgamma_star);
        if settings.include_added_mass {
            c.view_mut((0, d0), (ny, k))
                .copy_from(&(&steady.dfunstdgamma_dot / settings.dt));
        }

        let mut d = DMatrix::zeros(ny, nu);
        d.view_mut((0, 0), (ny, nz)).copy_from(&steady.dfqsdzeta);
        d.view_mut((0, nz), (ny, nz)).copy_from(&(-&steady.dfqsdu_ext));
        d.view_mut((0, 2 * nz), (ny, nz)).copy_from(&steady.dfqsdu_ext);

        let (ss, b_predictor) = if settings.remove_predictor {
            let b_mod = a.mul_same(&b);
            let d_mod = b.premul_dense(&c) + &d;
            let ss = StateSpace::new(a, b_mod, c, d_mod, settings.dt, InputTiming::Current)?;
            (ss, Some(b))
        } else {
            let ss = StateSpace::new(a, b, c, d, settings.dt, InputTiming::Next)?;
            (ss, None)
        };

        let inputs = VariableMap::new()
            .with(ZETA, nz)
            .with(ZETA_DOT, nz)
            .with(U_GUST, nz);
        let mut states = VariableMap::new();
        states
            .push(GAMMA, k)
            .push(GAMMA_W, k_star)
            .push(DTGAMMA_DOT, k);
        if order.has_lag() {
            states.push(GAMMA_M1, k);
        }
        let outputs = VariableMap::new().with(FORCES, ny);

        let cpu = CpuSummary {
            assemble: timer.stop_and_log(),
            ..CpuSummary::default()
        };
        cpu.log("dynamic model");
        tracing::info!(
            nx,
            nu,
            ny,
            order = u8::from(order),
            remove_predictor = settings.remove_predictor,
            nnz_a = ss.a.nnz(),
            "dynamic model assembled"
        );

        Ok(Self {
            steady,
            settings,
            ss,
            b_predictor,
            inputs,
            states,
            outputs,
            scaling,
            scaled: false,
            cpu,
        })
    }

    pub fn steady(&self) -> &'a SteadyAssembly {
        self.steady
    }

    pub fn settings(&self) -> &DynamicSettings {
        &self.settings
    }

    pub fn state_space(&self) -> &StateSpace<M> {
        &self.ss
    }

    pub fn into_state_space(self) -> StateSpace<M> {
        self.ss
    }

    /// Input matrix of the direct form, kept when the predictor is removed.
    pub fn b_predictor(&self) -> Option<&M> {
        self.b_predictor.as_ref()
    }

    pub fn is_predictor_removed(&self) -> bool {
        self.b_predictor.is_some()
    }

    pub fn inputs(&self) -> &VariableMap {
        &self.inputs
    }

    pub fn states(&self) -> &VariableMap {
        &self.states
    }

    pub fn outputs(&self) -> &VariableMap {
        &self.outputs
    }

    pub fn scaling(&self) -> &ScalingFactors {
        &self.scaling
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    pub fn cpu(&self) -> &CpuSummary {
        &self.cpu
    }

    pub fn dt(&self) -> f64 {
        self.ss.dt
    }

    pub fn order(&self) -> IntegrationOrder {
        self.settings.integration_order
    }

    /// Scale B, C, D and dt with the reference length, speed and density.
    pub fn nondimss(&mut self) -> SimResult<()> {
        if self.scaled {
            return Err(SimError::config("model is already non-dimensional"));
        }
        let timer = Timer::start("nondimss");
        self.apply_scaling(false);
        self.scaled = true;
        self.cpu.nondim = timer.stop_and_log();
        self.cpu.log("dynamic model");
        Ok(())
    }

    /// Exact inverse of [`DynamicModel::nondimss`].
    pub fn dimss(&mut self) -> SimResult<()> {
        if !self.scaled {
            return Err(SimError::config("model is already dimensional"));
        }
        let timer = Timer::start("dimss");
        self.apply_scaling(true);
        self.scaled = false;
        self.cpu.dim = timer.stop_and_log();
        self.cpu.log("dynamic model");
        Ok(())
    }

    fn apply_scaling(&mut self, inverse: bool) {
        let f = self.scaling;
        let factor = |x: f64| if inverse { 1.0 / x } else { x };
        for var in self.inputs.iter() {
            let reference = if var.name == ZETA { f.length } else { f.speed };
            let b_factor = factor(reference / f.circulation);
            self.ss.b.scale_columns(var.range.clone(), b_factor);
            if let Some(bp) = &mut self.b_predictor {
                bp.scale_columns(var.range.clone(), b_factor);
            }
            MatrixLike::scale_columns(&mut self.ss.d, var.range.clone(), factor(reference / f.force));
        }
        self.ss.c *= factor(f.circulation / f.force);
        self.ss.dt *= factor(1.0 / f.time);
    }

    /// Drop the named inputs from B, `B_predictor` and D.
    pub fn remove_inputs(&mut self, names: &[&str]) -> SimResult<()> {
        if let Some(unknown) = names.iter().find(|n| !self.inputs.contains(n)) {
            return Err(SimError::config(format!("unknown input variable '{unknown}'")));
        }
        let (inputs, kept) = self.inputs.without(names);
        self.ss.b = self.ss.b.keep_columns(&kept);
        self.ss.d = MatrixLike::keep_columns(&self.ss.d, &kept);
        if let Some(bp) = &self.b_predictor {
            self.b_predictor = Some(bp.keep_columns(&kept));
        }
        tracing::debug!(removed = ?names, nu = kept.len(), "inputs removed");
        self.inputs = inputs;
        Ok(())
    }

    /// Advance one step.
    ///
    /// `u_next` defaults to `u` (zero-order hold). With the predictor removed
    /// and `transform_state` set, `x` is the physical state and is converted
    /// on entry and exit; otherwise `x` is the model's own state.
    pub fn step(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        u_next: Option<&DVector<f64>>,
        transform_state: bool,
    ) -> SimResult<(DVector<f64>, DVector<f64>)> {
        let u_next = u_next.unwrap_or(u);
        self.ss.check_step_args(x, u, u_next)?;
        let ss = &self.ss;
        match &self.b_predictor {
            Some(bp) if transform_state => {
                let h = x - bp.mul_vec(u);
                let h1 = ss.a.mul_vec(&h) + ss.b.mul_vec(u);
                let y1 = &ss.c * &h1 + &ss.d * u_next;
                Ok((h1 + bp.mul_vec(u_next), y1))
            }
            Some(_) => {
                let h1 = ss.a.mul_vec(x) + ss.b.mul_vec(u);
                let y1 = &ss.c * &h1 + &ss.d * u_next;
                Ok((h1, y1))
            }
            None => {
                let x1 = ss.a.mul_vec(x) + ss.b.mul_vec(u_next);
                let y1 = &ss.c * &x1 + &ss.d * u_next;
                Ok((x1, y1))
            }
        }
    }

    /// Split a physical state into bound circulation, wake circulation and
    /// circulation rate.
    pub fn unpack_state(&self, x: &DVector<f64>) -> SimResult<UnpackedState> {
        if x.len() != self.ss.n_states() {
            return Err(SimError::vector_len("state", self.ss.n_states(), x.len()));
        }
        let (k, k_star) = (self.steady.k(), self.steady.k_star());
        Ok(UnpackedState {
            gamma: x.rows(0, k).into_owned(),
            gamma_star: x.rows(k, k_star).into_owned(),
            gamma_dot: x.rows(k + k_star, k).into_owned() / self.ss.dt,
        })
    }

    /// The model reduced to bound circulation, for the fast frequency solve
    /// and Gramian factors.
    ///
    /// Blocks are read from the current matrices, so scaling and removed
    /// inputs carry over. With the predictor removed the feed-through is
    /// restored to the direct form, `D = D_mod - C B_predictor`.
    pub fn circulation_system(&self) -> CirculationSystem<'a> {
        let steady: &'a SteadyAssembly = self.steady;
        let (k, k_star) = (self.steady.k(), self.steady.k_star());
        let nu = self.ss.n_inputs();
        let d0 = k + k_star;
        let b_src = self.b_predictor.as_ref().unwrap_or(&self.ss.b);
        let d = match &self.b_predictor {
            Some(bp) => &self.ss.d - bp.premul_dense(&self.ss.c),
            None => self.ss.d.clone(),
        };
        let c_lag = self
            .order()
            .has_lag()
            .then(|| self.ss.c.columns(d0 + k, k).into_owned());
        CirculationSystem {
            order: self.order(),
            dt: self.ss.dt,
            wake: &steady.wake,
            kernel: CirculationKernel::Propagator {
                p: self.ss.a.block(0..k, 0..k),
                pw: self.ss.a.block(0..k, k..d0),
            },
            b_bound: b_src.block(0..k, 0..nu),
            c_gamma: self.ss.c.columns(0, k).into_owned(),
            c_star: self.ss.c.columns(k, k_star).into_owned(),
            c_delta: self.ss.c.columns(d0, k).into_owned(),
            c_lag,
            d,
        }
    }

    /// Transfer function from inputs to outputs at the given angular
    /// frequencies, one K x K solve per frequency.
    ///
    /// Direct and predictor-removed models return the same response.
    pub fn freqresp(&self, frequencies: &[f64]) -> SimResult<FrequencyResponse> {
        let timer = Timer::start("fast frequency response");
        let out = self.circulation_system().freqresp(frequencies)?;
        let elapsed = timer.stop_and_log();
        tracing::info!(n_freq = frequencies.len(), elapsed_s = elapsed, "frequency response done");
        Ok(out)
    }
}

impl<M: MatrixLike> DiscreteModel for DynamicModel<'_, M> {
    fn n_states(&self) -> usize {
        self.ss.n_states()
    }

    fn n_inputs(&self) -> usize {
        self.ss.n_inputs()
    }

    fn n_outputs(&self) -> usize {
        self.ss.n_outputs()
    }

    fn dt(&self) -> f64 {
        self.ss.dt
    }

    fn step(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        u_next: &DVector<f64>,
    ) -> SimResult<(DVector<f64>, DVector<f64>)> {
        DynamicModel::step(self, x, u, Some(u_next), true)
    }
}
