use thiserror::Error;
use vx_lattice::LatticeError;
use vx_rom::RomError;
use vx_sim::SimError;
use vx_solver::SolverError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    #[error("Steady solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Model error: {0}")]
    Sim(#[from] SimError),

    #[error("Reduction error: {0}")]
    Rom(#[from] RomError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid argument: {0}")]
    Arg(String),
}

pub type CliResult<T> = Result<T, CliError>;
