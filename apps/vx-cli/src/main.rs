mod error;

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use nalgebra::{DMatrix, DVector, Vector3};
use num_complex::Complex64;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vx_core::{MatrixLike, SparseMatrix};
use vx_lattice::{LatticeBuilder, SurfaceGrid, SurrogateInfluence};
use vx_rom::{BalancingSettings, balfreq};
use vx_sim::variables::{FORCES, ZETA_DOT};
use vx_sim::{
    DynamicModel, DynamicSettings, IntegrationOrder, ScalingReference, SimOptions, SteadyMethod,
    VariableMap, max_modulus, run_sim, run_to_steady,
};
use vx_solver::SteadyAssembly;

use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "vx-cli")]
#[command(about = "Linearised vortex-lattice state-space models", long_about = None)]
struct Cli {
    #[command(flatten)]
    lattice: LatticeArgs,
    #[command(flatten)]
    model: ModelArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Flat rectangular wing with a straight wake.
#[derive(Args)]
struct LatticeArgs {
    /// Chordwise panels
    #[arg(long, global = true, default_value_t = 4)]
    m: usize,
    /// Spanwise panels
    #[arg(long, global = true, default_value_t = 2)]
    n: usize,
    /// Wake rows
    #[arg(long, global = true, default_value_t = 10)]
    m_star: usize,
    /// Chord in metres
    #[arg(long, global = true, default_value_t = 1.0)]
    chord: f64,
    /// Span in metres
    #[arg(long, global = true, default_value_t = 4.0)]
    span: f64,
    /// Free-stream speed in m/s
    #[arg(long, global = true, default_value_t = 10.0)]
    speed: f64,
    /// Angle of attack in degrees
    #[arg(long, global = true, default_value_t = 2.0)]
    alpha: f64,
    /// Air density in kg/m^3
    #[arg(long, global = true, default_value_t = 1.225)]
    density: f64,
}

#[derive(Args)]
struct ModelArgs {
    /// YAML file with dynamic settings; flags below override it
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Time step in seconds
    #[arg(long, global = true)]
    dt: Option<f64>,
    /// Finite-difference order of the circulation derivative (1 or 2)
    #[arg(long, global = true)]
    order: Option<u8>,
    /// Keep the predictor term instead of removing it
    #[arg(long, global = true)]
    keep_predictor: bool,
    /// Store A and B as sparse matrices
    #[arg(long, global = true)]
    sparse: bool,
    /// Non-dimensionalise with the chord, speed and density
    #[arg(long, global = true)]
    nondim: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the state-space model and print its layout
    Assemble,
    /// Lift response to a uniform heave rate over a frequency grid
    Freqresp {
        /// Number of frequencies
        #[arg(long, default_value_t = 20)]
        points: usize,
        /// Highest frequency as a fraction of the Nyquist frequency
        #[arg(long, default_value_t = 1.0)]
        fraction: f64,
    },
    /// March a constant heave rate and compare with the steady solution
    Step {
        /// Heave rate of every vertex (model units)
        #[arg(long, default_value_t = 1.0)]
        heave_rate: f64,
        /// Steps in the printed history
        #[arg(long, default_value_t = 40)]
        steps: usize,
        /// Print every N-th step
        #[arg(long, default_value_t = 5)]
        every: usize,
        /// Convergence tolerance on the outputs
        #[arg(long, default_value_t = 1e-8)]
        tol: f64,
    },
    /// Frequency-limited balanced truncation
    Balance {
        /// Band split as a fraction of the Nyquist frequency
        #[arg(long, default_value_t = 0.3)]
        cut: f64,
        /// Frequencies in the low band
        #[arg(long, default_value_t = 30)]
        n_low: usize,
        /// Frequencies in the high band
        #[arg(long, default_value_t = 30)]
        n_high: usize,
        /// Relative singular-value tolerance for the reduced order
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let asm = build_assembly(&cli.lattice)?;
    let mut settings = load_settings(&cli.model, &cli.lattice)?;
    if matches!(cli.command, Commands::Balance { .. }) {
        settings.remove_predictor = false;
    }

    if cli.model.sparse {
        run::<SparseMatrix>(&cli, &asm, settings)
    } else {
        run::<DMatrix<f64>>(&cli, &asm, settings)
    }
}

fn build_assembly(args: &LatticeArgs) -> CliResult<SteadyAssembly> {
    let alpha = args.alpha.to_radians();
    let u = Vector3::new(alpha.cos(), 0.0, alpha.sin()) * args.speed;
    let mut builder = LatticeBuilder::new(args.density);
    builder.add_surface(SurfaceGrid::rectangular(
        "wing",
        args.m,
        args.n,
        args.m_star,
        args.chord,
        args.span,
        u,
    ));
    let lattice = builder.build()?;
    Ok(SteadyAssembly::assemble(&lattice, &SurrogateInfluence::default())?)
}

fn load_settings(args: &ModelArgs, lattice: &LatticeArgs) -> CliResult<DynamicSettings> {
    let mut settings = match &args.settings {
        Some(path) => read_settings(path)?,
        None => DynamicSettings::default(),
    };
    if let Some(dt) = args.dt {
        settings.dt = dt;
    }
    if let Some(order) = args.order {
        settings.integration_order = IntegrationOrder::try_from(order)?;
    }
    if args.keep_predictor {
        settings.remove_predictor = false;
    }
    if args.nondim {
        settings.scaling = ScalingReference {
            length: lattice.chord,
            speed: lattice.speed,
            density: lattice.density,
        };
    }
    Ok(settings)
}

fn read_settings(path: &Path) -> CliResult<DynamicSettings> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

fn run<M: MatrixLike>(cli: &Cli, asm: &SteadyAssembly, settings: DynamicSettings) -> CliResult<()> {
    let mut model: DynamicModel<'_, M> = DynamicModel::assemble(asm, settings)?;
    if cli.model.nondim {
        model.nondimss()?;
    }
    match &cli.command {
        Commands::Assemble => print_yaml(&model_summary(&model, cli.model.sparse)),
        Commands::Freqresp { points, fraction } => cmd_freqresp(&model, *points, *fraction),
        Commands::Step {
            heave_rate,
            steps,
            every,
            tol,
        } => cmd_step(&model, *heave_rate, *steps, *every, *tol),
        Commands::Balance {
            cut,
            n_low,
            n_high,
            tol,
        } => cmd_balance(&model, *cut, *n_low, *n_high, *tol),
    }
}

fn print_yaml<T: Serialize>(value: &T) -> CliResult<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}

#[derive(Serialize)]
struct VariableSummary {
    name: String,
    start: usize,
    end: usize,
}

fn variables(map: &VariableMap) -> Vec<VariableSummary> {
    map.iter()
        .map(|v| VariableSummary {
            name: v.name.clone(),
            start: v.range.start,
            end: v.range.end,
        })
        .collect()
}

#[derive(Serialize)]
struct ModelSummary {
    k: usize,
    k_star: usize,
    kzeta: usize,
    form: &'static str,
    storage: &'static str,
    integration_order: u8,
    dt: f64,
    nondimensional: bool,
    states: usize,
    inputs: usize,
    outputs: usize,
    nnz_a: usize,
    nnz_b: usize,
    spectral_radius: Option<f64>,
    assemble_s: f64,
    input_variables: Vec<VariableSummary>,
    state_variables: Vec<VariableSummary>,
    output_variables: Vec<VariableSummary>,
}

fn model_summary<M: MatrixLike>(model: &DynamicModel<'_, M>, sparse: bool) -> ModelSummary {
    let ss = model.state_space();
    let spectral_radius = ss
        .a
        .to_dense()
        .try_schur(1e-12, 10_000)
        .map(|schur| schur.complex_eigenvalues().iter().map(|l| l.norm()).fold(0.0, f64::max));
    ModelSummary {
        k: model.steady().k(),
        k_star: model.steady().k_star(),
        kzeta: model.steady().kzeta(),
        form: if model.is_predictor_removed() {
            "predictor removed"
        } else {
            "direct"
        },
        storage: if sparse { "sparse" } else { "dense" },
        integration_order: model.order().into(),
        dt: model.dt(),
        nondimensional: model.is_scaled(),
        states: ss.n_states(),
        inputs: ss.n_inputs(),
        outputs: ss.n_outputs(),
        nnz_a: ss.a.nnz(),
        nnz_b: ss.b.nnz(),
        spectral_radius,
        assemble_s: model.cpu().assemble,
        input_variables: variables(model.inputs()),
        state_variables: variables(model.states()),
        output_variables: variables(model.outputs()),
    }
}

/// Inputs driving the vertical velocity of every vertex.
fn heave_columns<M: MatrixLike>(model: &DynamicModel<'_, M>) -> CliResult<Vec<usize>> {
    let kzeta = model.steady().kzeta();
    let range = model
        .inputs()
        .range(ZETA_DOT)
        .ok_or_else(|| CliError::Arg("model has no vertex-velocity inputs".into()))?;
    Ok((range.start + 2 * kzeta..range.start + 3 * kzeta).collect())
}

/// Outputs holding the vertical force on every vertex.
fn lift_rows<M: MatrixLike>(model: &DynamicModel<'_, M>) -> CliResult<Vec<usize>> {
    let kzeta = model.steady().kzeta();
    let range = model
        .outputs()
        .range(FORCES)
        .ok_or_else(|| CliError::Arg("model has no force outputs".into()))?;
    Ok((range.start + 2 * kzeta..range.start + 3 * kzeta).collect())
}

#[derive(Serialize)]
struct FrequencyRow {
    w: f64,
    lift_re: f64,
    lift_im: f64,
    magnitude: f64,
    phase_deg: f64,
    max_gain: f64,
}

#[derive(Serialize)]
struct FrequencySummary {
    dt: f64,
    nyquist: f64,
    elapsed_s: f64,
    points: Vec<FrequencyRow>,
}

fn cmd_freqresp<M: MatrixLike>(
    model: &DynamicModel<'_, M>,
    points: usize,
    fraction: f64,
) -> CliResult<()> {
    if points < 2 {
        return Err(CliError::Arg("at least two frequencies are needed".into()));
    }
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(CliError::Arg(format!("fraction must lie in (0, 1], got {fraction}")));
    }
    let nyquist = PI / model.dt();
    let w_max = fraction * nyquist;
    let frequencies: Vec<f64> = (0..points)
        .map(|i| w_max * i as f64 / (points - 1) as f64)
        .collect();
    let cols = heave_columns(model)?;
    let rows = lift_rows(model)?;

    let start = std::time::Instant::now();
    let response = model.freqresp(&frequencies)?;
    let elapsed_s = start.elapsed().as_secs_f64();

    let points = frequencies
        .iter()
        .zip(&response.data)
        .map(|(&w, h)| {
            let lift: Complex64 = rows
                .iter()
                .flat_map(|&i| cols.iter().map(move |&j| h[(i, j)]))
                .sum();
            FrequencyRow {
                w,
                lift_re: lift.re,
                lift_im: lift.im,
                magnitude: lift.norm(),
                phase_deg: lift.arg().to_degrees(),
                max_gain: max_modulus(h),
            }
        })
        .collect();
    print_yaml(&FrequencySummary {
        dt: model.dt(),
        nyquist,
        elapsed_s,
        points,
    })
}

#[derive(Serialize)]
struct HistoryRow {
    t: f64,
    lift: f64,
}

#[derive(Serialize)]
struct StepSummary {
    heave_rate: f64,
    history: Vec<HistoryRow>,
    steps_to_steady: usize,
    residual: f64,
    marched_lift: f64,
    steady_lift: f64,
    relative_difference: f64,
}

fn cmd_step<M: MatrixLike>(
    model: &DynamicModel<'_, M>,
    heave_rate: f64,
    steps: usize,
    every: usize,
    tol: f64,
) -> CliResult<()> {
    if steps == 0 {
        return Err(CliError::Arg("at least one step is needed".into()));
    }
    let ss = model.state_space();
    let mut u = DVector::zeros(ss.n_inputs());
    for j in heave_columns(model)? {
        u[j] = heave_rate;
    }
    let rows = lift_rows(model)?;
    let lift = |y: &DVector<f64>| rows.iter().map(|&i| y[i]).sum::<f64>();
    let x0 = DVector::zeros(ss.n_states());

    let inputs = vec![u.clone(); steps + 1];
    let opts = SimOptions {
        record_every: every.max(1),
        ..SimOptions::default()
    };
    let record = run_sim(model, &x0, &inputs, &opts)?;
    let history = record
        .t
        .iter()
        .zip(&record.y)
        .map(|(&t, y)| HistoryRow { t, lift: lift(y) })
        .collect();

    let marched = run_to_steady(model, &x0, &u, tol, opts.max_steps)?;
    let steady = model.solve_steady(&u, SteadyMethod::Direct)?;
    let marched_lift = lift(&marched.y);
    let steady_lift = lift(&steady.y);
    print_yaml(&StepSummary {
        heave_rate,
        history,
        steps_to_steady: marched.steps,
        residual: marched.residual,
        marched_lift,
        steady_lift,
        relative_difference: (marched_lift - steady_lift).abs() / steady_lift.abs().max(1e-300),
    })
}

#[derive(Serialize)]
struct BalanceSummary {
    full_order: usize,
    balanced_order: usize,
    reduced_order: usize,
    leading_singular_values: Vec<f64>,
    discarded: f64,
    low_band_error: f64,
    low_band_peak: f64,
}

fn cmd_balance<M: MatrixLike>(
    model: &DynamicModel<'_, M>,
    cut: f64,
    n_low: usize,
    n_high: usize,
    tol: f64,
) -> CliResult<()> {
    let settings = BalancingSettings::split_nyquist(model.dt(), cut, n_low, n_high)?;
    let balanced = balfreq(model, &settings)?;
    let reduced = balanced.truncate_to(tol)?;

    let w = &settings.low.frequencies;
    let full = model.freqresp(w)?;
    let low_band_error = reduced.freqresp(w)?.max_abs_diff(&full)?;
    print_yaml(&BalanceSummary {
        full_order: model.state_space().n_states(),
        balanced_order: balanced.order(),
        reduced_order: reduced.order(),
        leading_singular_values: balanced.gv.iter().take(10).copied().collect(),
        discarded: balanced.discarded(reduced.order()),
        low_band_error,
        low_band_peak: full.max_abs(),
    })
}
