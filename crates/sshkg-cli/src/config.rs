//! Client configuration at `~/.sshkg/config.toml`.
//!
//! Provides the default algorithm, comment and output directory, plus the
//! interactive timings. CLI flags always override config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sshkg_core::Algorithm;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation defaults.
    #[serde(default)]
    pub default: DefaultConfig,

    /// Interactive front end settings.
    #[serde(default)]
    pub interactive: InteractiveConfig,
}

/// Generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Algorithm used when `-t` is not given: "rsa", "ed25519" or "ecdsa".
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Comment appended to the public key (empty = none).
    #[serde(default)]
    pub comment: String,

    /// Directory for the default key file names.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Log file for interactive sessions (logs are discarded when unset).
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            comment: String::new(),
            directory: default_directory(),
            log_file: None,
        }
    }
}

/// Interactive timings in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveConfig {
    /// Progress animation frame period.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Pause at 100% before the completion screen.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_algorithm() -> String {
    "rsa".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_tick_ms() -> u64 {
    100
}

fn default_settle_ms() -> u64 {
    2000
}

impl Config {
    /// Default config location (`~/.sshkg/config.toml`).
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(".sshkg").join("config.toml")
    }

    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config.default_algorithm()?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parsed default algorithm.
    pub fn default_algorithm(&self) -> Result<Algorithm> {
        self.default
            .algorithm
            .parse::<Algorithm>()
            .context("invalid [default] algorithm in config")
    }
}

impl InteractiveConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
