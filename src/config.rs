//! Configuration loading.
//!
//! Reads `./tcds.toml` (or `$TCDS_CONFIG_PATH`). Environment variables
//! override file values; file values override defaults.
//!
//! The deny-lists are intentionally absent: they are compiled in, see
//! [`crate::guard::policy`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::audit::DEFAULT_AUDIT_LOG;
use crate::store::DEFAULT_STATE_FILE;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tcds.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Locations of the state file and audit log.
    pub paths: PathsConfig,
    /// Diagnostic logging settings.
    pub logging: LoggingConfig,
}

/// Filesystem locations. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Persisted guard state.
    pub state_file: PathBuf,
    /// Append-only audit log.
    pub audit_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            audit_log: PathBuf::from(DEFAULT_AUDIT_LOG),
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// When set, JSON logs are also written here with daily rotation.
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            logs_dir: None,
        }
    }
}

impl GuardConfig {
    /// Load with precedence env vars > TOML file > defaults.
    ///
    /// A missing config file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Same as [`GuardConfig::load`].
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = env("TCDS_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to read config at {}: {e}",
                    path.display()
                ))
            }
        };

        config.apply_overrides(env);
        Ok(config)
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or unknown keys.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function so tests avoid mutating the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("TCDS_STATE_FILE") {
            self.paths.state_file = PathBuf::from(v);
        }
        if let Some(v) = env("TCDS_AUDIT_LOG") {
            self.paths.audit_log = PathBuf::from(v);
        }
        if let Some(v) = env("TCDS_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("TCDS_LOGS_DIR") {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }
    }
}
