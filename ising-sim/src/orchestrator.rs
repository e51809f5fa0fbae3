use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, TaskFailure};
use crate::events::TaskEvent;
use crate::mcmc::{Engine, RunOutcome};

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Cooperative stop request, shared between a handle and a running task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Generator for task `task`: `seed + task` when seeded, OS entropy otherwise.
pub(crate) fn task_rng(seed: Option<u64>, task: usize) -> Xoshiro256StarStar {
    match seed {
        Some(base) => Xoshiro256StarStar::seed_from_u64(base.wrapping_add(task as u64)),
        None => Xoshiro256StarStar::from_entropy(),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Default)]
struct Tally {
    remaining: usize,
    completed: usize,
    cancelled: usize,
    failed: usize,
}

struct Shared {
    sink: Box<dyn Fn(TaskEvent) + Send + Sync>,
    tally: Mutex<Tally>,
    done: Mutex<bool>,
    finished: Condvar,
}

impl Shared {
    /// Deliver a terminal event. A panicking consumer must not stop the
    /// bookkeeping that follows.
    fn emit_guarded(&self, event: TaskEvent) {
        if panic::catch_unwind(AssertUnwindSafe(|| (self.sink)(event))).is_err() {
            warn!("event consumer panicked while handling a terminal event");
        }
    }

    fn finish(&self, how: Finish) {
        let summary = {
            let mut tally = lock(&self.tally);
            match how {
                Finish::Completed => tally.completed += 1,
                Finish::Cancelled => tally.cancelled += 1,
                Finish::Failed => tally.failed += 1,
            }
            tally.remaining -= 1;
            (tally.remaining == 0).then(|| (tally.completed, tally.cancelled, tally.failed))
        };

        if let Some((completed, cancelled, failed)) = summary {
            info!(completed, cancelled, failed, "experiment finished");
            self.emit_guarded(TaskEvent::ExperimentFinished {
                completed,
                cancelled,
                failed,
            });
            *lock(&self.done) = true;
            self.finished.notify_all();
        }
    }
}

/// A validated experiment, ready to run one engine per temperature.
///
/// Cancellation tokens exist before the tasks start, so a consumer can wire
/// them into its event handling ahead of time.
pub struct Orchestrator {
    config: ExperimentConfig,
    pool: ThreadPool,
    all: CancelToken,
    tasks: Vec<CancelToken>,
}

impl Orchestrator {
    pub fn new(config: ExperimentConfig) -> Result<Self, StartError> {
        config.check()?;
        let n_tasks = config.n_tasks();
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_tasks)
            .thread_name(|i| format!("ising-task-{i}"))
            .build()?;
        Ok(Self {
            config,
            pool,
            all: CancelToken::new(),
            tasks: (0..n_tasks).map(|_| CancelToken::new()).collect(),
        })
    }

    /// Validate `config` and start every task, sending events to `sink`.
    pub fn start<F>(config: ExperimentConfig, sink: F) -> Result<ExperimentHandle, StartError>
    where
        F: Fn(TaskEvent) + Send + Sync + 'static,
    {
        Ok(Self::new(config)?.spawn(sink))
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Token that stops every task in the experiment.
    pub fn cancel_token(&self) -> CancelToken {
        self.all.clone()
    }

    /// Token that stops only task `task`.
    pub fn task_cancel_token(&self, task: usize) -> Option<CancelToken> {
        self.tasks.get(task).cloned()
    }

    /// Start every task and return immediately.
    ///
    /// `sink` is called from the worker threads; events from one task arrive
    /// in order, events from different tasks interleave arbitrarily.
    pub fn spawn<F>(self, sink: F) -> ExperimentHandle
    where
        F: Fn(TaskEvent) + Send + Sync + 'static,
    {
        let n_tasks = self.config.n_tasks();
        info!(
            tasks = n_tasks,
            width = self.config.lattice.width,
            height = self.config.lattice.height,
            "starting experiment"
        );

        let shared = Arc::new(Shared {
            sink: Box::new(sink),
            tally: Mutex::new(Tally {
                remaining: n_tasks,
                ..Tally::default()
            }),
            done: Mutex::new(false),
            finished: Condvar::new(),
        });

        for (task, token) in self.tasks.iter().enumerate() {
            let shared = Arc::clone(&shared);
            let token = token.clone();
            let all = self.all.clone();
            let lattice = self.config.lattice;
            let schedule = self.config.schedule_for(task);
            let rng = task_rng(self.config.seed, task);

            self.pool.spawn(move || {
                debug!(task, kt_j = 1.0 / schedule.coupling_strength, "task started");

                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut engine = Engine::new(&lattice, schedule, rng);
                    let outcome = engine.run(
                        || token.is_cancelled() || all.is_cancelled(),
                        |event| (shared.sink)(TaskEvent::Progress { task, event }),
                    )?;
                    Ok::<_, TaskFailure>((outcome, engine.results()))
                }));

                let (event, how) = match run {
                    Ok(Ok((RunOutcome::Completed, results))) => {
                        debug!(task, "task completed");
                        (TaskEvent::Completed { task, results }, Finish::Completed)
                    }
                    Ok(Ok((RunOutcome::Cancelled { step }, _))) => {
                        info!(task, step, "task cancelled");
                        (TaskEvent::Cancelled { task, step }, Finish::Cancelled)
                    }
                    Ok(Err(failure)) => {
                        warn!(task, %failure, "task failed");
                        (TaskEvent::Failed { task, failure }, Finish::Failed)
                    }
                    Err(payload) => {
                        let failure = TaskFailure::Panicked(panic_message(payload));
                        warn!(task, %failure, "task failed");
                        (TaskEvent::Failed { task, failure }, Finish::Failed)
                    }
                };
                shared.emit_guarded(event);
                shared.finish(how);
            });
        }

        ExperimentHandle {
            shared,
            all: self.all,
            tasks: self.tasks,
            _pool: self.pool,
        }
    }

    /// Like [`Orchestrator::spawn`], delivering events over a channel.
    pub fn spawn_with_channel(self) -> (ExperimentHandle, Receiver<TaskEvent>) {
        let (tx, rx) = mpsc::channel();
        let handle = self.spawn(move |event| {
            // The receiver going away just means nobody is listening any more.
            let _ = tx.send(event);
        });
        (handle, rx)
    }
}

/// Control surface for a running experiment.
pub struct ExperimentHandle {
    shared: Arc<Shared>,
    all: CancelToken,
    tasks: Vec<CancelToken>,
    _pool: ThreadPool,
}

impl ExperimentHandle {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Ask every task to stop at its next sweep boundary.
    pub fn cancel(&self) {
        info!("cancelling experiment");
        self.all.cancel();
    }

    /// Ask one task to stop; returns `false` if no such task exists.
    pub fn cancel_task(&self, task: usize) -> bool {
        match self.tasks.get(task) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        *lock(&self.shared.done)
    }

    /// Block until every task has completed, been cancelled, or failed.
    pub fn wait(&self) {
        let mut done = lock(&self.shared.done);
        while !*done {
            done = self
                .shared
                .finished
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
