use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, TaskFailure};
use crate::mcmc::{Engine, RunOutcome};
use crate::orchestrator::task_rng;
use crate::statistics::ThermoResults;

/// Final state of one temperature after a blocking run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub task: usize,
    pub kt_j: f64,
    /// Last unit of `k` processed.
    pub step: i64,
    pub outcome: Result<RunOutcome, TaskFailure>,
    pub results: Option<ThermoResults>,
}

/// Run every temperature of `config` to completion on the global rayon pool
/// and return one report per temperature, in input order.
///
/// No progress events are produced. Setting `interrupted` stops every engine
/// at its next sweep boundary.
pub fn run_blocking(
    config: &ExperimentConfig,
    interrupted: &AtomicBool,
) -> Result<Vec<TaskReport>, ConfigError> {
    config.check()?;

    let reports = (0..config.n_tasks())
        .into_par_iter()
        .map(|task| {
            let schedule = config.schedule_for(task);
            let mut engine = Engine::new(&config.lattice, schedule, task_rng(config.seed, task));
            let outcome = engine
                .run(|| interrupted.load(Ordering::Relaxed), |_| {})
                .map_err(TaskFailure::from);
            TaskReport {
                task,
                kt_j: config.temperatures[task],
                step: engine.step(),
                outcome,
                results: engine.results(),
            }
        })
        .collect();

    Ok(reports)
}
