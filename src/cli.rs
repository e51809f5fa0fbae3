use clap::Parser;
use ising_sim::config::{ExperimentConfig, LatticeConfig, ScheduleConfig, DEFAULT_TEMPERATURES};

#[derive(Parser, Debug)]
#[command(name = "ising")]
#[command(about = "Metropolis Monte Carlo for the 2D Ising model, one thread per temperature", long_about = None)]
pub struct Args {
    /// Lattice width
    #[arg(long, default_value_t = 20)]
    pub nx: usize,

    /// Lattice height (defaults to the width)
    #[arg(long)]
    pub ny: Option<usize>,

    /// Equilibration sweeps per site
    #[arg(long, default_value_t = 100_000)]
    pub neq: usize,

    /// Sampling sweeps per site
    #[arg(long, default_value_t = 100_000)]
    pub nst: usize,

    /// Sweeps between samples
    #[arg(long, default_value_t = 10)]
    pub fs: usize,

    /// Sweeps between progress reports
    #[arg(long, default_value_t = 1000)]
    pub fo: usize,

    /// Comma-separated reduced temperatures kT/J
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_temperature,
        default_values_t = DEFAULT_TEMPERATURES.to_vec()
    )]
    pub temps: Vec<f64>,

    /// Base seed; task i uses seed + i. Omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Cancel the experiment after this many seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Hide the live progress bars
    #[arg(long)]
    pub quiet: bool,
}

fn parse_temperature(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid temperature {s:?}: {e}"))
}

impl Args {
    pub fn experiment_config(&self) -> ExperimentConfig {
        ExperimentConfig {
            lattice: LatticeConfig {
                width: self.nx,
                height: self.ny.unwrap_or(self.nx),
            },
            schedule: ScheduleConfig {
                equilibration_sweeps: self.neq,
                sampling_sweeps: self.nst,
                sample_interval: self.fs,
                report_interval: self.fo,
            },
            temperatures: self.temps.clone(),
            seed: self.seed,
        }
    }
}
