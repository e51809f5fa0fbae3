use color_eyre::eyre::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Completion bookkeeping for every task of an experiment, fed from the
/// `step` of each event.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    neq: i64,
    nst: i64,
    steps: Vec<i64>,
    done: Vec<bool>,
}

impl ProgressTracker {
    pub fn new(n_tasks: usize, neq: usize, nst: usize) -> Self {
        let neq = neq as i64;
        Self {
            neq,
            nst: nst as i64,
            steps: vec![-neq; n_tasks],
            done: vec![false; n_tasks],
        }
    }

    pub fn record(&mut self, task: usize, step: i64) {
        self.steps[task] = step.clamp(-self.neq, self.nst);
    }

    pub fn mark_done(&mut self, task: usize) {
        self.done[task] = true;
    }

    pub fn all_done(&self) -> bool {
        self.done.iter().all(|&d| d)
    }

    pub fn is_sampling(&self, task: usize) -> bool {
        self.steps[task] >= 0
    }

    /// Fraction of the current phase's bar: equilibration while `step < 0`,
    /// sampling afterwards.
    pub fn task_fraction(&self, task: usize) -> f64 {
        let step = self.steps[task];
        if step < 0 {
            1.0 + step as f64 / self.neq as f64
        } else {
            step as f64 / self.nst as f64
        }
    }

    /// Whole-experiment completion, `(neq + mean step) / (neq + nst)`.
    pub fn overall(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let mean = self.steps.iter().sum::<i64>() as f64 / self.steps.len() as f64;
        (self.neq as f64 + mean) / (self.neq + self.nst) as f64
    }

    /// Equilibration sweeps finished by `task`.
    pub fn neq_done(&self, task: usize) -> i64 {
        self.neq + self.steps[task].min(0)
    }

    /// Sampling sweeps finished by `task`.
    pub fn nst_done(&self, task: usize) -> i64 {
        self.steps[task].max(0)
    }
}

/// Live terminal display: one bar per temperature and one for the experiment.
pub struct ProgressDisplay {
    _multi: MultiProgress,
    tasks: Vec<ProgressBar>,
    total: ProgressBar,
    sampling: Vec<bool>,
    equil_style: ProgressStyle,
    sample_style: ProgressStyle,
    neq: u64,
    nst: u64,
}

const SCALE: u64 = 1000;

impl ProgressDisplay {
    pub fn new(temperatures: &[f64], neq: usize, nst: usize, hidden: bool) -> Result<Self> {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let equil_style = ProgressStyle::with_template(
            "{prefix:>10} equil  [{bar:40.yellow/blue}] {pos}/{len}",
        )?
        .progress_chars("=> ");
        let sample_style = ProgressStyle::with_template(
            "{prefix:>10} sample [{bar:40.green/blue}] {pos}/{len}",
        )?
        .progress_chars("=> ");
        let total_style = ProgressStyle::with_template(
            "{prefix:>10}        [{bar:40.cyan/blue}] {percent:>3}% [{elapsed_precise} < {eta_precise}]",
        )?
        .progress_chars("=> ");

        let tasks = temperatures
            .iter()
            .map(|t| {
                let pb = multi.add(ProgressBar::new(neq as u64));
                pb.set_style(equil_style.clone());
                pb.set_prefix(format!("kT={t:.3}"));
                pb
            })
            .collect();

        let total = multi.add(ProgressBar::new(SCALE));
        total.set_style(total_style);
        total.set_prefix("total");

        Ok(Self {
            _multi: multi,
            tasks,
            total,
            sampling: vec![false; temperatures.len()],
            equil_style,
            sample_style,
            neq: neq as u64,
            nst: nst as u64,
        })
    }

    pub fn update(&mut self, tracker: &ProgressTracker, task: usize) {
        let pb = &self.tasks[task];
        if tracker.is_sampling(task) && !self.sampling[task] {
            self.sampling[task] = true;
            pb.set_style(self.sample_style.clone());
            pb.set_length(self.nst);
        }
        let len = if self.sampling[task] { self.nst } else { self.neq };
        pb.set_position((tracker.task_fraction(task) * len as f64).round() as u64);
        self.total
            .set_position((tracker.overall() * SCALE as f64).round() as u64);
    }

    pub fn finish_task(&self, task: usize, msg: &'static str) {
        self.tasks[task].abandon_with_message(msg);
    }

    pub fn finish(&self) {
        self.total.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let t = ProgressTracker::new(3, 1000, 2000);
        assert_eq!(t.task_fraction(0), 0.0);
        assert_eq!(t.overall(), 0.0);
        assert_eq!(t.neq_done(1), 0);
        assert_eq!(t.nst_done(1), 0);
        assert!(!t.all_done());
    }

    #[test]
    fn test_fractions_by_phase() {
        let mut t = ProgressTracker::new(2, 1000, 2000);
        t.record(0, -250);
        assert!(!t.is_sampling(0));
        assert!((t.task_fraction(0) - 0.75).abs() < 1e-12);
        assert_eq!(t.neq_done(0), 750);

        t.record(1, 500);
        assert!(t.is_sampling(1));
        assert!((t.task_fraction(1) - 0.25).abs() < 1e-12);
        assert_eq!(t.neq_done(1), 1000);
        assert_eq!(t.nst_done(1), 500);

        // mean step 125
        assert!((t.overall() - 1125.0 / 3000.0).abs() < 1e-12);
    }

    #[test]
    fn test_completion() {
        let mut t = ProgressTracker::new(2, 1000, 1000);
        t.record(0, 1000);
        t.mark_done(0);
        assert!(!t.all_done());

        t.record(1, 400);
        t.mark_done(1);
        assert!(t.all_done());
        assert_eq!(t.nst_done(1), 400);
        assert!((t.overall() - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_steps_are_clamped() {
        let mut t = ProgressTracker::new(1, 1000, 1000);
        t.record(0, 5000);
        assert_eq!(t.task_fraction(0), 1.0);
        t.record(0, -5000);
        assert_eq!(t.neq_done(0), 0);
    }
}
