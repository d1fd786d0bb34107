//! The error reporter
//!
//! One task consumes every [`ErrorRecord`] of a compilation, logs it and
//! keeps a summary. It ends once every [`ErrorSink`](firefly_core::ErrorSink)
//! has been dropped.

use std::fmt::Write;

use firefly_core::diagnostics::{ErrorRecord, UnitCompilationError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ReporterError;

/// Everything reported during one compilation
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub parsing_exceptions: usize,
    pub compilation_exceptions: usize,
    pub unit_errors: Vec<UnitCompilationError>,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.parsing_exceptions + self.compilation_exceptions + self.unit_errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    fn record(&mut self, record: ErrorRecord) {
        match record {
            ErrorRecord::ParsingException { .. } => self.parsing_exceptions += 1,
            ErrorRecord::CompilationException { .. } => self.compilation_exceptions += 1,
            ErrorRecord::UnitCompilation(error) => self.unit_errors.push(error),
        }
    }
}

pub struct ErrorReporter {
    rx: mpsc::UnboundedReceiver<ErrorRecord>,
}

impl ErrorReporter {
    pub fn new(rx: mpsc::UnboundedReceiver<ErrorRecord>) -> Self {
        Self { rx }
    }

    pub fn spawn(rx: mpsc::UnboundedReceiver<ErrorRecord>) -> JoinHandle<Result<ReportSummary, ReporterError>> {
        tokio::spawn(Self::new(rx).run())
    }

    /// Report records until every sink is gone
    ///
    /// A record that cannot be formatted stops the reporter.
    pub async fn run(mut self) -> Result<ReportSummary, ReporterError> {
        let mut summary = ReportSummary::default();
        while let Some(record) = self.rx.recv().await {
            let report = format_record(&record)?;
            error!("{}", report);
            summary.record(record);
        }
        debug!("Error reporter finished with {} error(s)", summary.total());
        Ok(summary)
    }
}

/// Human readable form of a record
pub fn format_record(record: &ErrorRecord) -> Result<String, ReporterError> {
    let mut out = String::new();
    match record {
        ErrorRecord::ParsingException { unit, cause } => {
            write!(out, "An exception occurred while parsing Firefly Source Units")?;
            if let Some(unit) = unit {
                write!(out, " ({})", unit)?;
            }
            write!(out, "\n  Cause: {:#}", cause)?;
        }
        ErrorRecord::CompilationException { unit, cause } => {
            write!(out, "An exception occurred while compiling Firefly Source Units")?;
            if let Some(unit) = unit {
                write!(out, " ({})", unit)?;
            }
            write!(out, "\n  Cause: {:#}", cause)?;
        }
        ErrorRecord::UnitCompilation(error) => {
            write!(
                out,
                "An error occurred while compiling Firefly Source Unit: {}\n  Message: {}.",
                error.location(),
                error.message
            )?;
            if !error.details.is_empty() {
                write!(out, "\n  Additional details: {}", error.details.join("\n  "))?;
            }
        }
    }
    Ok(out)
}
