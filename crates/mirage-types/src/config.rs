//! Session configuration.
//!
//! Loaded from TOML by the hosting application and handed to the terminal
//! core at session construction. All fields have defaults so an empty
//! document is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunable knobs for one terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Maximum number of scrollback lines retained by the output buffer.
    pub scrollback_lines: usize,
    /// Milliseconds the pipeline runner waits for the worker before falling
    /// back to synchronous execution.
    pub pipeline_timeout_ms: u64,
    /// Whether network-shaped commands are intercepted and simulated.
    pub safe_mode: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            scrollback_lines: 1000,
            pipeline_timeout_ms: 6000,
            safe_mode: false,
        }
    }
}

impl TerminalConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
