use thiserror::Error;

/// Rejected experiment configuration. Nothing is spawned when this is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one temperature must be requested")]
    NoTemperatures,
    #[error("temperature {index} is {value}, expected a finite value > 0")]
    InvalidTemperature { index: usize, value: f64 },
    #[error("parameter out of range: {0}")]
    OutOfRange(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine already reached the end of its sampling schedule")]
    Complete,
    #[error("accumulated statistics became non-finite at step {step}")]
    NonFinite { step: i64 },
}

/// Terminal fault inside one task. Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("task panicked: {0}")]
    Panicked(String),
}
