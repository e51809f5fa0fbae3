use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::debug;

use super::step::metropolis_step;
use crate::config::{LatticeConfig, SimulationSchedule};
use crate::error::EngineError;
use crate::events::ProgressEvent;
use crate::geometry::Lattice;
use crate::statistics::{Accumulator, ThermoResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Equilibrating,
    Sampling,
    Complete,
}

/// How a call to [`Engine::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Stopped by the cancellation predicate; `step` is the last unit processed.
    Cancelled { step: i64 },
}

/// One Metropolis simulation at a single temperature.
///
/// The loop variable `k` runs from `1 - neq` to `nst`. Each unit of `k` is one
/// sweep per site: `N` moves on uniformly chosen sites. Units with `k <= 0`
/// equilibrate; units with `k > 0` sample into the accumulator.
pub struct Engine<R = Xoshiro256StarStar> {
    lattice: Lattice,
    schedule: SimulationSchedule,
    accumulator: Accumulator,
    rng: R,
    /// Next unit of `k` to process.
    next_k: i64,
    magnetization: i64,
    energy_over_eps: i64,
}

impl<R: Rng> Engine<R> {
    /// Cold-start engine: every spin +1.
    pub fn new(lattice: &LatticeConfig, schedule: SimulationSchedule, rng: R) -> Self {
        let lattice = Lattice::new(lattice.width, lattice.height);
        let magnetization = lattice.total_magnetization();
        let energy_over_eps = lattice.total_energy_over_epsilon();
        Self {
            lattice,
            schedule,
            accumulator: Accumulator::new(),
            rng,
            next_k: schedule.first_step(),
            magnetization,
            energy_over_eps,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.next_k > self.schedule.sampling_sweeps {
            Phase::Complete
        } else if self.next_k > 0 {
            Phase::Sampling
        } else {
            Phase::Equilibrating
        }
    }

    /// Last unit of `k` processed (`-neq` before the first one).
    pub fn step(&self) -> i64 {
        self.next_k - 1
    }

    pub fn schedule(&self) -> &SimulationSchedule {
        &self.schedule
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Running Σ s, maintained from per-move deltas.
    pub fn magnetization(&self) -> i64 {
        self.magnetization
    }

    /// Running E/ε, maintained from per-move deltas.
    pub fn energy_over_epsilon(&self) -> i64 {
        self.energy_over_eps
    }

    /// Current derived statistics, if any sample has been taken.
    pub fn results(&self) -> Option<ThermoResults> {
        self.accumulator
            .derived(self.lattice.n_spins, self.schedule.coupling_strength)
    }

    /// Process one unit of `k`.
    ///
    /// Returns the progress event when `k` is a report boundary.
    pub fn advance(&mut self) -> Result<Option<ProgressEvent>, EngineError> {
        if self.phase() == Phase::Complete {
            return Err(EngineError::Complete);
        }
        let k = self.next_k;
        let eps = self.schedule.coupling_strength;

        if k == 1 {
            debug!(kt_j = 1.0 / eps, "equilibration finished, sampling");
            self.accumulator.reset();
        }

        for _ in 0..self.lattice.n_spins {
            let info = metropolis_step(&mut self.lattice, eps, &mut self.rng);
            self.magnetization += info.delta_magnetization;
            self.energy_over_eps += info.delta_energy_over_eps;
        }
        self.next_k += 1;

        if k > 0 && k % self.schedule.sample_interval == 0 {
            self.accumulator.push(
                self.magnetization.abs() as f64,
                self.energy_over_eps as f64 * eps,
            );
            if !self.accumulator.is_finite() {
                return Err(EngineError::NonFinite { step: k });
            }
        }

        if k % self.schedule.report_interval == 0 {
            return Ok(Some(ProgressEvent {
                step: k,
                results: self.results(),
                lattice: Some(self.lattice.snapshot()),
            }));
        }
        Ok(None)
    }

    /// Run to completion, checking `cancelled` before every unit of `k` and
    /// passing report events to `emit` in order of increasing step.
    pub fn run(
        &mut self,
        cancelled: impl Fn() -> bool,
        mut emit: impl FnMut(ProgressEvent),
    ) -> Result<RunOutcome, EngineError> {
        while self.phase() != Phase::Complete {
            if cancelled() {
                return Ok(RunOutcome::Cancelled { step: self.step() });
            }
            if let Some(event) = self.advance()? {
                emit(event);
            }
        }
        Ok(RunOutcome::Completed)
    }
}
