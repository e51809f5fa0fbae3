pub mod engine;
pub mod step;

pub use engine::{Engine, Phase, RunOutcome};
pub use step::{metropolis_step, try_flip, StepInfo};
