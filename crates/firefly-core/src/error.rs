use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read unit content: {0}")]
    Content(#[from] std::io::Error),

    #[error("Unsupported unit kind: {0}")]
    UnsupportedUnitKind(String),
}

/// Errors surfaced by the resolution tables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Resolution has ended, '{name}' cannot be registered under '{owner}'")]
    RegistrationClosed { owner: String, name: String },

    #[error("Resolution table is no longer running")]
    TableClosed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InlineError {
    #[error("Cannot inline '{function}': expected {expected} argument(s), found {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown intrinsic function: {0}")]
    UnknownIntrinsic(String),
}
