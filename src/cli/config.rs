//! Console configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration and so is no file at all.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Console configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Records per page (default 50)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Root for streamed result directories
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,

    /// Responses above this size go to disk, or fail in buffer-only mode
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: u64,

    /// Allow large responses to be streamed (default true)
    #[serde(default = "default_prefer_stream")]
    pub prefer_stream: bool,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    50
}
fn default_spool_dir() -> String {
    "./docquery-spool".to_string()
}
fn default_max_buffer_bytes() -> u64 {
    1048576
} // 1 MiB
fn default_prefer_stream() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            spool_dir: default_spool_dir(),
            max_buffer_bytes: default_max_buffer_bytes(),
            prefer_stream: default_prefer_stream(),
            log_level: default_log_level(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: ConsoleConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.page_size == 0 {
            return Err(CliError::config_error("page_size must be > 0"));
        }

        if self.max_buffer_bytes == 0 {
            return Err(CliError::config_error("max_buffer_bytes must be > 0"));
        }

        if self.spool_dir.trim().is_empty() {
            return Err(CliError::config_error("spool_dir must not be empty"));
        }

        self.severity()?;

        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        match Severity::parse(&self.log_level) {
            Some(Severity::Fatal) | None => Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error.",
                self.log_level
            ))),
            Some(severity) => Ok(severity),
        }
    }

    /// Spool root as a path
    pub fn spool_path(&self) -> PathBuf {
        PathBuf::from(&self.spool_dir)
    }
}
