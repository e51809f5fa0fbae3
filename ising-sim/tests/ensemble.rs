use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use ising_sim::config::{ExperimentConfig, LatticeConfig, ScheduleConfig, SimulationSchedule};
use ising_sim::error::{EngineError, TaskFailure};
use ising_sim::events::{ProgressEvent, TaskEvent};
use ising_sim::mcmc::{Engine, Phase};
use ising_sim::orchestrator::Orchestrator;
use ising_sim::parallel::run_blocking;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

fn sweeps(fs: usize, fo: usize) -> ScheduleConfig {
    ScheduleConfig {
        equilibration_sweeps: 1000,
        sampling_sweeps: 1000,
        sample_interval: fs,
        report_interval: fo,
    }
}

fn small_experiment(temperatures: Vec<f64>, fo: usize, seed: Option<u64>) -> ExperimentConfig {
    ExperimentConfig {
        lattice: LatticeConfig::square(4),
        schedule: sweeps(10, fo),
        temperatures,
        seed,
    }
}

/// Run one engine on a 4x4 lattice, returning `(step, samples so far, ⟨|M|⟩/N)`
/// for every report that carried results.
fn sampled_reports(kt_j: f64, seed: u64) -> Vec<(i64, u64, f64)> {
    let mut engine = Engine::new(
        &LatticeConfig::square(4),
        SimulationSchedule::new(kt_j, &sweeps(10, 1000)),
        Xoshiro256StarStar::seed_from_u64(seed),
    );
    let n = engine.lattice().n_spins as i64;
    let mut out = Vec::new();
    while engine.phase() != Phase::Complete {
        let event = engine.advance().unwrap();
        assert!((-n..=n).contains(&engine.magnetization()));
        if let Some(ProgressEvent {
            step,
            results: Some(r),
            ..
        }) = event
        {
            out.push((step, engine.accumulator().sample_count, r.magnetization));
        }
    }
    out
}

#[test]
fn high_temperature_is_disordered() {
    let reports = sampled_reports(100.0, 2024);
    assert_eq!(reports.len(), 1);
    let (step, samples, m) = reports[0];
    assert_eq!(step, 1000);
    assert_eq!(samples, 100);
    assert!((0.0..0.6).contains(&m), "⟨|M|⟩/N = {m}");
}

#[test]
fn low_temperature_is_ordered() {
    let reports = sampled_reports(0.1, 7);
    assert_eq!(reports.len(), 1);
    let (_, samples, m) = reports[0];
    assert_eq!(samples, 100);
    assert!(m > 0.99 && m <= 1.0, "⟨|M|⟩/N = {m}");
}

#[test]
fn orchestrated_run_reports_once_per_boundary() {
    let (handle, rx) = Orchestrator::new(small_experiment(vec![100.0, 0.1], 1000, Some(5)))
        .unwrap()
        .spawn_with_channel();
    handle.wait();

    let events: Vec<TaskEvent> = rx.try_iter().collect();
    for task in 0..2 {
        let steps: Vec<(i64, bool, bool)> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Progress { task: t, event } if *t == task => Some((
                    event.step,
                    event.results.is_some(),
                    event.lattice.as_ref().is_some_and(|l| l.len() == 16),
                )),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![(0, false, true), (1000, true, true)]);

        let completed = events.iter().find_map(|e| match e {
            TaskEvent::Completed { task: t, results } if *t == task => Some(*results),
            _ => None,
        });
        let results = completed.flatten().expect("task should complete with results");
        assert!((0.0..=1.0).contains(&results.magnetization));
    }
    assert_eq!(
        events.last(),
        Some(&TaskEvent::ExperimentFinished {
            completed: 2,
            cancelled: 0,
            failed: 0
        })
    );
}

#[test]
fn cancelling_one_task_leaves_sibling_running() {
    let orch = Orchestrator::new(small_experiment(vec![2.0, 3.0], 100, Some(11))).unwrap();
    let stop_first = orch.task_cancel_token(0).unwrap();
    let log: Arc<Mutex<Vec<TaskEvent>>> = Arc::default();

    let sink_log = Arc::clone(&log);
    let handle = orch.spawn(move |event| {
        if let TaskEvent::Progress { task: 0, event: ref p } = event {
            if p.step == 0 {
                stop_first.cancel();
            }
        }
        sink_log.lock().unwrap().push(event);
    });
    handle.wait();

    let events = log.lock().unwrap().clone();
    let steps_of = |task: usize| -> Vec<i64> {
        events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Progress { task: t, event } if *t == task => Some(event.step),
                _ => None,
            })
            .collect()
    };

    let first = steps_of(0);
    assert_eq!(first.last(), Some(&0));
    assert!(events.contains(&TaskEvent::Cancelled { task: 0, step: 0 }));

    let second = steps_of(1);
    assert!(second.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(second.first(), Some(&-900));
    assert_eq!(second.last(), Some(&1000));
    assert_eq!(second.len(), 20);
    assert!(events
        .iter()
        .any(|e| matches!(e, TaskEvent::Completed { task: 1, .. })));

    assert_eq!(
        events.last(),
        Some(&TaskEvent::ExperimentFinished {
            completed: 1,
            cancelled: 1,
            failed: 0
        })
    );
}

#[test]
fn pathological_coupling_fails_only_its_task() {
    // 1 / 1e-320 overflows to an infinite coupling.
    let (handle, rx) = Orchestrator::new(small_experiment(vec![2.0, 1e-320], 1000, Some(3)))
        .unwrap()
        .spawn_with_channel();
    handle.wait();
    let events: Vec<TaskEvent> = rx.try_iter().collect();

    assert!(events.contains(&TaskEvent::Failed {
        task: 1,
        failure: TaskFailure::Engine(EngineError::NonFinite { step: 10 }),
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, TaskEvent::Progress { task: 1, event } if event.step > 0)));
    assert!(events
        .iter()
        .any(|e| matches!(e, TaskEvent::Completed { task: 0, results: Some(_) })));
    assert_eq!(
        events.last(),
        Some(&TaskEvent::ExperimentFinished {
            completed: 1,
            cancelled: 0,
            failed: 1
        })
    );
}

#[test]
fn unseeded_runs_satisfy_invariants() {
    let interrupted = AtomicBool::new(false);
    let cfg = small_experiment(vec![1.5, 2.27, 4.0], 1000, None);
    for _ in 0..2 {
        let reports = run_blocking(&cfg, &interrupted).unwrap();
        for r in reports {
            assert!(r.outcome.is_ok());
            let res = r.results.unwrap();
            assert!((0.0..=1.0).contains(&res.magnetization));
            assert!(res.susceptibility >= -1e-9);
            assert!(res.specific_heat >= -1e-9);
            assert!((-2.0 / r.kt_j - 1e-9..=2.0 / r.kt_j + 1e-9).contains(&res.energy));
        }
    }
}
