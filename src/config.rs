//! Configuration handling for the tripleflow CLI
//!
//! Settings come from an optional `tripleflow.toml` in the config directory.
//!
//! ## Environment Variables
//!
//! The following environment variables override config file settings:
//!
//! - `TRIPLEFLOW_FORMAT` - Result format (`csv`, `tsv`, `json`, `text`)
//! - `TRIPLEFLOW_ROW_LIMIT` - Maximum number of result rows
//! - `TRIPLEFLOW_LOG` - Log filter used when `RUST_LOG` is not set
//!
//! These can be set in a `.env` file in the config directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tripleflow_core::QueryLimits;

use crate::error::{AppError, AppResult};
use crate::output::ResultFormat;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "tripleflow.toml";

/// Environment variable names
pub const ENV_FORMAT: &str = "TRIPLEFLOW_FORMAT";
pub const ENV_ROW_LIMIT: &str = "TRIPLEFLOW_ROW_LIMIT";
pub const ENV_LOG: &str = "TRIPLEFLOW_LOG";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Result format
    #[serde(default)]
    pub format: ResultFormat,
    /// Maximum number of result rows
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,
    /// Log filter directives
    #[serde(default = "default_log")]
    pub log: String,
}

fn default_row_limit() -> usize {
    QueryLimits::default().max_rows
}

fn default_log() -> String {
    "tripleflow=info,tripleflow_core=info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: ResultFormat::default(),
            row_limit: default_row_limit(),
            log: default_log(),
        }
    }
}

impl Config {
    /// Load configuration from a directory
    ///
    /// This also loads any `.env` file in the directory and applies
    /// environment variable overrides. A missing config file means defaults.
    pub fn load(dir: &Path) -> AppResult<Self> {
        // Load env file if present (ignore errors)
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let mut config = Self::load_file(dir)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Read `tripleflow.toml` from `dir` without consulting the environment.
    pub fn load_file(dir: &Path) -> AppResult<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup(ENV_FORMAT).filter(|v| !v.is_empty()) {
            self.format = format.parse()?;
        }

        if let Some(limit) = lookup(ENV_ROW_LIMIT).filter(|v| !v.is_empty()) {
            self.row_limit = limit.trim().parse().map_err(|_| {
                AppError::InvalidConfig(format!("{} must be a number, got '{}'", ENV_ROW_LIMIT, limit))
            })?;
        }

        if let Some(log) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log = log;
        }

        self.validate()
    }

    fn validate(&self) -> AppResult<()> {
        if self.row_limit == 0 {
            return Err(AppError::InvalidConfig(
                "row_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Execution limits for the engine
    pub fn limits(&self) -> QueryLimits {
        QueryLimits::with_max_rows(self.row_limit)
    }
}
