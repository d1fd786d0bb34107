//! Compiler configuration
//!
//! Loaded from a TOML file (conventionally `firefly.toml`); every key is
//! optional:
//!
//! ```toml
//! max_parallel_units = 8
//! input_errors = "continue"
//! channel_capacity = 64
//! resolution_buffer = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

pub const CONFIG_FILE_NAME: &str = "firefly.toml";

/// What to do when the unit input itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStrategy {
    /// Report the error and stop accepting units
    #[default]
    FailFast,

    /// Report the error and keep draining the input
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Maximum number of units parsing or generating code at once; unset is unbounded
    pub max_parallel_units: Option<usize>,
    pub input_errors: RecoveryStrategy,
    /// Capacity of the declared and compiled unit channels
    pub channel_capacity: usize,
    /// How many registrations a waiting lookup may fall behind before re-checking
    pub resolution_buffer: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_parallel_units: None,
            input_errors: RecoveryStrategy::FailFast,
            channel_capacity: 64,
            resolution_buffer: 256,
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let config: CompilerConfig =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_parallel_units == Some(0) {
            return Err(PipelineError::Config(
                "max_parallel_units must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.resolution_buffer == 0 {
            return Err(PipelineError::Config(
                "resolution_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_parallel_units(mut self, limit: usize) -> Self {
        self.max_parallel_units = Some(limit);
        self
    }

    pub fn with_input_errors(mut self, strategy: RecoveryStrategy) -> Self {
        self.input_errors = strategy;
        self
    }
}
