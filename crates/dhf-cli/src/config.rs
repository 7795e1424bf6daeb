//! CLI configuration.

use anyhow::{bail, Context, Result};
use dhf_core::EngineConfig;

use crate::cli::OutputFormat;

/// Configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Reconstruction engine settings
    pub engine: EngineConfig,

    /// Output format used when `--format` is not given
    pub format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            format: OutputFormat::Text,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DHF_TRACE`: emit per-segment reconstruction events (`1`/`true`/`yes`/`on`)
    /// - `DHF_FORMAT`: default output format, `text` or `json`
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unrecognised value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(trace) = lookup("DHF_TRACE") {
            config.engine.trace = parse_flag(&trace).context("Invalid DHF_TRACE")?;
        }

        if let Some(format) = lookup("DHF_FORMAT") {
            config.format = format
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid DHF_FORMAT")?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
