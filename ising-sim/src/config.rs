use validator::Validate;

use crate::error::ConfigError;

/// Reduced temperatures swept by default, bracketing the 2D critical point
/// `kT_c/J ≈ 2.269`.
pub const DEFAULT_TEMPERATURES: [f64; 10] = [
    2.174, 2.222, 2.247, 2.260, 2.273, 2.286, 2.299, 2.326, 2.381, 2.439,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct LatticeConfig {
    #[validate(range(min = 3, max = 100))]
    pub width: usize,
    #[validate(range(min = 3, max = 100))]
    pub height: usize,
}

impl LatticeConfig {
    pub fn square(side: usize) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    pub fn n_spins(&self) -> usize {
        self.width * self.height
    }
}

/// Sweep counts, all in units of sweeps per site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct ScheduleConfig {
    #[validate(range(min = 1000, max = 1_000_000))]
    pub equilibration_sweeps: usize,
    #[validate(range(min = 1000, max = 1_000_000))]
    pub sampling_sweeps: usize,
    #[validate(range(min = 1, max = 1_000_000))]
    pub sample_interval: usize,
    #[validate(range(min = 1, max = 1_000_000))]
    pub report_interval: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            equilibration_sweeps: 100_000,
            sampling_sweeps: 100_000,
            sample_interval: 10,
            report_interval: 1000,
        }
    }
}

/// Immutable per-temperature schedule handed to one engine.
///
/// Counts are signed so the engine can run its loop variable from
/// `1 - equilibration_sweeps` to `sampling_sweeps` without casts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSchedule {
    /// `ε = J / kT`.
    pub coupling_strength: f64,
    pub equilibration_sweeps: i64,
    pub sampling_sweeps: i64,
    pub sample_interval: i64,
    pub report_interval: i64,
}

impl SimulationSchedule {
    pub fn new(kt_j: f64, sweeps: &ScheduleConfig) -> Self {
        Self {
            coupling_strength: 1.0 / kt_j,
            equilibration_sweeps: sweeps.equilibration_sweeps as i64,
            sampling_sweeps: sweeps.sampling_sweeps as i64,
            sample_interval: sweeps.sample_interval as i64,
            report_interval: sweeps.report_interval as i64,
        }
    }

    /// First value of the loop variable `k`.
    pub fn first_step(&self) -> i64 {
        1 - self.equilibration_sweeps
    }
}

/// One experiment: a lattice size and schedule shared by every requested
/// temperature. One task is spawned per entry of `temperatures`.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ExperimentConfig {
    #[validate]
    pub lattice: LatticeConfig,
    #[validate]
    pub schedule: ScheduleConfig,
    /// Reduced temperatures `kT/J`.
    pub temperatures: Vec<f64>,
    /// Base seed; task `i` uses `seed + i`. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig::square(20),
            schedule: ScheduleConfig::default(),
            temperatures: DEFAULT_TEMPERATURES.to_vec(),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Validate every field; fails fast on the first class of problem found.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.temperatures.is_empty() {
            return Err(ConfigError::NoTemperatures);
        }
        if let Some((index, &value)) = self
            .temperatures
            .iter()
            .enumerate()
            .find(|(_, t)| !(t.is_finite() && **t > 0.0))
        {
            return Err(ConfigError::InvalidTemperature { index, value });
        }
        self.validate()?;
        Ok(())
    }

    pub fn n_tasks(&self) -> usize {
        self.temperatures.len()
    }

    pub fn schedule_for(&self, task: usize) -> SimulationSchedule {
        SimulationSchedule::new(self.temperatures[task], &self.schedule)
    }
}
