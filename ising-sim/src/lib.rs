//! Single-spin-flip Metropolis simulation of the 2D Ising model, run as an
//! ensemble of independent temperatures.

pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod mcmc;
pub mod orchestrator;
pub mod parallel;
pub mod statistics;

pub use config::{ExperimentConfig, LatticeConfig, ScheduleConfig, SimulationSchedule};
pub use error::{ConfigError, EngineError, TaskFailure};
pub use events::{ProgressEvent, TaskEvent};
pub use geometry::Lattice;
pub use mcmc::{Engine, Phase, RunOutcome};
pub use orchestrator::{CancelToken, ExperimentHandle, Orchestrator, StartError};
pub use parallel::{run_blocking, TaskReport};
pub use statistics::{Accumulator, ThermoResults};
