use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unit '{unit}' did not compile ({errors} error(s) reported)")]
    UnitFailed { unit: String, errors: usize },

    #[error(transparent)]
    Reporter(#[from] ReporterError),

    #[error("Pipeline stage failed: {0}")]
    Stage(#[from] tokio::task::JoinError),
}

/// Failure of the error reporter itself
#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Failed to format an error report: {0}")]
    Format(#[from] std::fmt::Error),
}
