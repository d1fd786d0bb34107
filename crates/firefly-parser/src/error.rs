use firefly_core::error::{CoreError, ResolutionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{line}:{offset}: unexpected character '{found}'")]
    UnexpectedCharacter { found: char, line: u32, offset: usize },

    #[error("{line}:{offset}: unterminated {what} literal")]
    Unterminated {
        what: &'static str,
        line: u32,
        offset: usize,
    },

    #[error("{line}:{offset}: invalid {what} literal '{text}'")]
    InvalidLiteral {
        what: &'static str,
        text: String,
        line: u32,
        offset: usize,
    },

    #[error("{line}:{offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
        offset: usize,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Reading unit content failed: {0}")]
    ContentTask(#[from] tokio::task::JoinError),
}

impl From<std::io::Error> for ParserError {
    fn from(err: std::io::Error) -> Self {
        ParserError::Core(CoreError::Content(err))
    }
}
