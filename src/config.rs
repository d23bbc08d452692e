//! Interpreter configuration
//!
//! Every option is optional; missing fields take the defaults below. A
//! configuration can be written in TOML:
//!
//! ```toml
//! display_name = "game"
//! instructions_per_tick = 20
//! tag_messages = true
//! allow_import = false
//! ```

use crate::interpreter::constants::DEFAULT_INSTRUCTIONS_PER_TICK;
use crate::interpreter::errors::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Name used in reports and console tags until `[display]` overrides it
    pub display_name: String,
    /// Host environment, checked by `[environment]`
    pub environment: String,
    /// Log every executed statement at trace level
    pub verbose: bool,
    pub group_messages: bool,
    pub tag_messages: bool,
    pub timestamp_messages: bool,
    /// Deliver fatal reports to the error callback
    pub report_errors: bool,
    /// `start` runs the whole script synchronously
    pub run_to_completion: bool,
    pub instructions_per_tick: usize,
    pub tick_interval_ms: u64,
    pub allow_export: bool,
    pub allow_import: bool,
    /// Disallowed operations fail instead of warning
    pub halt_on_disallowed: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            display_name: "script".to_string(),
            environment: "terminal".to_string(),
            verbose: false,
            group_messages: true,
            tag_messages: false,
            timestamp_messages: false,
            report_errors: true,
            run_to_completion: false,
            instructions_per_tick: DEFAULT_INSTRUCTIONS_PER_TICK,
            tick_interval_ms: 16,
            allow_export: true,
            allow_import: true,
            halt_on_disallowed: false,
        }
    }
}

impl InterpreterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, RuntimeError> {
        let config: InterpreterConfig = toml::from_str(text)
            .map_err(|e| RuntimeError::Environment(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Environment(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.instructions_per_tick == 0 {
            return Err(RuntimeError::Environment(
                "instructions_per_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
