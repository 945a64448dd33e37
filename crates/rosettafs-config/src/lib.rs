//! # rosettafs-config
//!
//! Configuration management for rosettafs.
//!
//! Loads configuration from:
//! 1. `~/.rosettafs/config.toml` (global), or an explicit path
//! 2. Environment variables (highest priority)
//!
//! The mount policy itself (single-threaded, foreground, `allow_other`,
//! read-only, non-empty mountpoint allowed) is fixed and has no knobs here.

pub mod logging;

pub use logging::{init_logging, LogLevel};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides `[logging] level`
pub const ENV_LOG_LEVEL: &str = "ROSETTAFS_LOG_LEVEL";
/// Overrides `[binfmt] name`
pub const ENV_BINFMT_NAME: &str = "ROSETTAFS_BINFMT_NAME";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML render error: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid log level: {0:?}")]
    InvalidLogLevel(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub binfmt: BinfmtConfig,
    pub mount: MountConfig,
}

impl Config {
    /// Load config from `path`, or from the global location when `None`.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::global_config_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => {
                debug!("Loading config from {:?}", p);
                Self::from_file(&p)?
            }
            _ => Config::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a single TOML file without applying any overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.rosettafs/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".rosettafs/config.toml"))
    }

    /// Apply environment variable overrides through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(name) = lookup(ENV_BINFMT_NAME) {
            self.binfmt.name = name;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.logging.level()?;
        Ok(())
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default config TOML string
    pub fn default_toml() -> Result<String, ConfigError> {
        Config::default().to_toml()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug, trace
    pub level: String,
}

impl LoggingConfig {
    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Naming used in the printed binfmt_misc registration hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinfmtConfig {
    /// Handler name passed to `update-binfmts --install`
    pub name: String,
}

impl Default for BinfmtConfig {
    fn default() -> Self {
        Self {
            name: "rosetta".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Filesystem name shown in the mount table
    pub fsname: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fsname: "rosettafs".to_string(),
        }
    }
}
