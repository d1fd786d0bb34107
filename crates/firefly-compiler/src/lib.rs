//! Concurrent compilation pipeline for Firefly
//!
//! [`CompilationPipeline`] parses, resolves and generates code for many
//! units at once. Errors never abort the pipeline; they are sent to a single
//! reporter and summarized when the compilation finishes.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod reporter;

pub use config::{CompilerConfig, RecoveryStrategy, CONFIG_FILE_NAME};
pub use error::{PipelineError, PipelineResult, ReporterError};
pub use pipeline::{Compilation, CompilationPipeline};
pub use reporter::{format_record, ErrorReporter, ReportSummary};
