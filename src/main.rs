//! Command-line driver: runs one Metropolis simulation per temperature and
//! prints the thermodynamic averages of each.

use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use ising_sim::{Orchestrator, TaskEvent, ThermoResults};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod progress;

use cli::Args;
use progress::{ProgressDisplay, ProgressTracker};

const POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Running,
    Completed,
    Cancelled,
    Failed,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    setup_logging();

    let config = args.experiment_config();
    let temperatures = config.temperatures.clone();
    let n_tasks = config.n_tasks();
    let (neq, nst) = (
        config.schedule.equilibration_sweeps,
        config.schedule.sampling_sweeps,
    );

    let orchestrator = Orchestrator::new(config).wrap_err("invalid experiment configuration")?;
    let (handle, rx) = orchestrator.spawn_with_channel();

    let mut tracker = ProgressTracker::new(n_tasks, neq, nst);
    let mut display = ProgressDisplay::new(&temperatures, neq, nst, args.quiet)?;
    let mut results: Vec<Option<ThermoResults>> = vec![None; n_tasks];
    let mut status = vec![Status::Running; n_tasks];

    let deadline = args
        .time_limit
        .map(|secs| Instant::now() + Duration::from_secs_f64(secs.max(0.0)));
    let mut timed_out = false;

    loop {
        let wait = match deadline {
            Some(d) if !timed_out => d.saturating_duration_since(Instant::now()).min(POLL),
            _ => POLL,
        };
        match rx.recv_timeout(wait) {
            Ok(TaskEvent::Progress { task, event }) => {
                tracker.record(task, event.step);
                if event.results.is_some() {
                    results[task] = event.results;
                }
                display.update(&tracker, task);
            }
            Ok(TaskEvent::Completed {
                task,
                results: final_results,
            }) => {
                tracker.record(task, nst as i64);
                tracker.mark_done(task);
                results[task] = final_results;
                status[task] = Status::Completed;
                display.update(&tracker, task);
                display.finish_task(task, "done");
            }
            Ok(TaskEvent::Cancelled { task, step }) => {
                tracker.record(task, step);
                tracker.mark_done(task);
                status[task] = Status::Cancelled;
                display.update(&tracker, task);
                display.finish_task(task, "cancelled");
            }
            Ok(TaskEvent::Failed { task, failure }) => {
                warn!(task, kt_j = temperatures[task], %failure, "simulation failed");
                tracker.mark_done(task);
                status[task] = Status::Failed;
                display.finish_task(task, "failed");
            }
            Ok(TaskEvent::ExperimentFinished { .. }) => break,
            Err(RecvTimeoutError::Timeout) => {
                if let Some(d) = deadline {
                    if !timed_out && Instant::now() >= d {
                        info!("time limit reached");
                        handle.cancel();
                        timed_out = true;
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    handle.wait();
    display.finish();
    if !tracker.all_done() {
        warn!("event stream ended before every task reported");
    }

    print_summary(&temperatures, &results, &status, &tracker);
    Ok(())
}

fn print_summary(
    temperatures: &[f64],
    results: &[Option<ThermoResults>],
    status: &[Status],
    tracker: &ProgressTracker,
) {
    println!(
        "{:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9} {:>9} {:>9}",
        "kT/J", "M", "UL", "Cv", "chi", "H", "complete", "neq_done", "nst_done"
    );
    for (task, kt_j) in temperatures.iter().enumerate() {
        let cells = match results[task] {
            Some(r) => format!(
                "{:>10.5} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
                r.magnetization, r.binder_cumulant, r.specific_heat, r.susceptibility, r.energy
            ),
            None => format!("{:>10} {:>10} {:>10} {:>10} {:>10}", "-", "-", "-", "-", "-"),
        };
        println!(
            "{:>8.3} {} {:>9} {:>9} {:>9}",
            kt_j,
            cells,
            status[task] == Status::Completed,
            tracker.neq_done(task),
            tracker.nst_done(task)
        );
    }
}
