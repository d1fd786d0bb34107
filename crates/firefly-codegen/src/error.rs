use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Unsupported image version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
