use crate::error::TaskFailure;
use crate::statistics::ThermoResults;

/// Emitted by an engine on every report boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Sweeps per site elapsed: negative while equilibrating, positive while
    /// sampling.
    pub step: i64,
    /// Present once at least one sample has been accumulated.
    pub results: Option<ThermoResults>,
    /// Copy of the spin configuration at `step`.
    pub lattice: Option<Vec<i8>>,
}

/// Everything an experiment reports to its consumer.
///
/// `task` is the index of the temperature in the experiment's configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Progress {
        task: usize,
        event: ProgressEvent,
    },
    /// The task processed its final sampling sweep.
    Completed {
        task: usize,
        results: Option<ThermoResults>,
    },
    /// The task observed a cancellation request after finishing `step`.
    Cancelled { task: usize, step: i64 },
    Failed { task: usize, failure: TaskFailure },
    /// Every task has completed, been cancelled, or failed. Sent exactly once.
    ExperimentFinished {
        completed: usize,
        cancelled: usize,
        failed: usize,
    },
}

impl TaskEvent {
    /// Task index, or `None` for the experiment-level event.
    pub fn task(&self) -> Option<usize> {
        match self {
            Self::Progress { task, .. }
            | Self::Completed { task, .. }
            | Self::Cancelled { task, .. }
            | Self::Failed { task, .. } => Some(*task),
            Self::ExperimentFinished { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}
