//! Error records produced by the pipeline stages
//!
//! Every stage reports through an [`ErrorSink`]; a single reporter task owns
//! the receiving end and serializes the output.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::unit::CompilationUnit;

/// Location of a construct in the unit's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub stop_line: u32,
    /// Character offset of the first character
    pub start_offset: usize,
    /// Character offset of the last character (inclusive)
    pub stop_offset: usize,
}

impl SourceSpan {
    pub fn new(start_line: u32, stop_line: u32, start_offset: usize, stop_offset: usize) -> Self {
        Self {
            start_line,
            stop_line,
            start_offset,
            stop_offset,
        }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: SourceSpan) -> SourceSpan {
        SourceSpan {
            start_line: self.start_line,
            stop_line: other.stop_line,
            start_offset: self.start_offset,
            stop_offset: other.stop_offset,
        }
    }

    pub fn is_single_line(&self) -> bool {
        self.start_line == self.stop_line
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_line() {
            write!(
                f,
                "{} {}:{}",
                self.start_line, self.start_offset, self.stop_offset
            )
        } else {
            write!(
                f,
                "{}:{} {}::{}",
                self.start_line, self.stop_line, self.start_offset, self.stop_offset
            )
        }
    }
}

/// A semantic error inside one unit; translation continues after it
#[derive(Debug, Clone)]
pub struct UnitCompilationError {
    pub unit: Arc<CompilationUnit>,
    pub span: SourceSpan,
    pub message: String,
    pub details: Vec<String>,
}

impl UnitCompilationError {
    pub fn new(
        unit: Arc<CompilationUnit>,
        span: SourceSpan,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            unit,
            span,
            message: message.into(),
            details,
        }
    }

    /// `path/File.firefly:line start:stop`
    pub fn location(&self) -> String {
        format!("{}:{}", self.unit.display_path(), self.span)
    }
}

#[derive(Debug)]
pub enum ErrorRecord {
    /// Unexpected failure while parsing or translating a unit
    ParsingException {
        unit: Option<String>,
        cause: anyhow::Error,
    },
    /// Unexpected failure while generating code for a unit
    CompilationException {
        unit: Option<String>,
        cause: anyhow::Error,
    },
    UnitCompilation(UnitCompilationError),
}

impl ErrorRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            ErrorRecord::ParsingException { .. } => "ParsingException",
            ErrorRecord::CompilationException { .. } => "CompilationException",
            ErrorRecord::UnitCompilation(_) => "UnitCompilationError",
        }
    }
}

/// Cloneable producer handle for the error reporter
#[derive(Debug, Clone)]
pub struct ErrorSink {
    tx: mpsc::UnboundedSender<ErrorRecord>,
}

impl ErrorSink {
    pub fn channel() -> (ErrorSink, mpsc::UnboundedReceiver<ErrorRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ErrorSink { tx }, rx)
    }

    pub fn report(&self, record: ErrorRecord) {
        if let Err(mpsc::error::SendError(record)) = self.tx.send(record) {
            warn!("Error reporter is gone, dropping {}: {:?}", record.kind(), record);
        }
    }

    pub fn parsing(&self, unit: Option<&CompilationUnit>, cause: anyhow::Error) {
        self.report(ErrorRecord::ParsingException {
            unit: unit.map(|u| u.display_path()),
            cause,
        });
    }

    pub fn compilation(&self, unit: Option<&CompilationUnit>, cause: anyhow::Error) {
        self.report(ErrorRecord::CompilationException {
            unit: unit.map(|u| u.display_path()),
            cause,
        });
    }

    pub fn unit_error(&self, error: UnitCompilationError) {
        self.report(ErrorRecord::UnitCompilation(error));
    }
}
