//! CLI Configuration
//!
//! Settings come from, lowest priority first: built-in defaults,
//! `config/default` and `config/local` (any supported format), the file given
//! with `--config`, then `CAPBANK__*` environment variables. Command-line
//! flags override all of them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use capbank_types::{Amount, AmountParseError};
use serde::{Deserialize, Serialize};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Defaults for new banks
    #[serde(default)]
    pub bank: BankSettings,

    /// Where bank state lives
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults used by `capbank init`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSettings {
    /// Bank cap in whole units (decimal string)
    #[serde(default = "default_cap")]
    pub cap: String,

    /// Construction-time endowment in whole units
    #[serde(default = "default_endowment")]
    pub endowment: String,
}

impl Default for BankSettings {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            endowment: default_endowment(),
        }
    }
}

impl BankSettings {
    pub fn cap_amount(&self) -> Result<Amount, AmountParseError> {
        self.cap.parse()
    }

    pub fn endowment_amount(&self) -> Result<Amount, AmountParseError> {
        self.endowment.parse()
    }
}

/// State file settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path of the JSON state file
    pub state_file: Option<PathBuf>,
}

impl StorageSettings {
    /// Configured state file, or `<data dir>/capbank/state.json`
    pub fn state_path(&self) -> PathBuf {
        match &self.state_file {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("capbank")
                .join("state.json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_cap() -> String {
    "1000".to_string()
}

fn default_endowment() -> String {
    "0".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl CliConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Environment variables with CAPBANK__ prefix, e.g. CAPBANK__BANK__CAP=500
        builder = builder.add_source(config::Environment::with_prefix("CAPBANK").separator("__"));

        let config = builder.build().context("failed to read configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }
}
