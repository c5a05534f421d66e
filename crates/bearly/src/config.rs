//! Configuration file support for bearly.
//!
//! Loads configuration from `bearly.toml` in the data directory, or from the
//! path given with `--config`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bearly_core::{Coach, CommandCoach, RuleCoach};
use bearly_logging::LogFormat;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "bearly.toml";

/// Settings loaded from `bearly.toml`. Every key is optional; command-line
/// flags take priority over the file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the session state and sleep log live
    pub data_dir: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    /// Append every activity event as a JSON line to this file
    pub activity_log: Option<PathBuf>,
    /// Fixed seed for the uplifting message picker
    pub seed: Option<u64>,
    #[serde(default)]
    pub coach: CoachConfig,
}

/// Which coaching-tip service to use
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CoachConfig {
    #[serde(default)]
    pub kind: CoachKind,
    /// Program to run when `kind = "command"`
    pub command: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoachKind {
    #[default]
    Rules,
    Command,
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Build the configured coach.
    pub fn build_coach(&self) -> Result<Box<dyn Coach>> {
        match self.coach.kind {
            CoachKind::Rules => Ok(Box::new(RuleCoach)),
            CoachKind::Command => {
                let program = self
                    .coach
                    .command
                    .clone()
                    .context("coach.kind is \"command\" but coach.command is not set")?;
                let timeout = self
                    .coach
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(CommandCoach::DEFAULT_TIMEOUT);
                Ok(Box::new(
                    CommandCoach::new(program, self.coach.args.clone()).with_timeout(timeout),
                ))
            }
        }
    }
}
