//! Configuration for Massive Stub
//!
//! Settings for the emulated database, the auth stub and logging. Values come
//! from defaults, an optional TOML file and `MS_*` environment overrides.

use crate::constants::{DEFAULT_LOG_LEVEL, ENV_PREFIX};
use crate::core::error::{Error, Result};
use crate::{log_info, log_warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database emulator configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Auth stub configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database emulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Value reported at the connection-state path by the built-in seed
    #[serde(default = "default_connected")]
    pub connected: bool,

    /// JSON file used to seed the store instead of the built-in fixtures
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// Auth stub configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Uid handed out by anonymous sign-in
    #[serde(default = "default_anonymous_uid")]
    pub anonymous_uid: String,

    /// Display name handed out by anonymous sign-in
    #[serde(default = "default_anonymous_display_name")]
    pub anonymous_display_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_connected() -> bool {
    true
}

fn default_anonymous_uid() -> String {
    crate::fixtures::ANONYMOUS_USER_1_UID.to_string()
}

fn default_anonymous_display_name() -> String {
    crate::fixtures::ANONYMOUS_USER_1_NAME.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connected: default_connected(),
            seed_file: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            anonymous_uid: default_anonymous_uid(),
            anonymous_display_name: default_anonymous_display_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Apply overrides from an arbitrary key lookup (keys without prefix)
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup("SEED_FILE") {
            self.database.seed_file = Some(PathBuf::from(seed));
        }

        if let Some(connected) = lookup("CONNECTED") {
            self.database.connected = connected
                .parse()
                .map_err(|e| Error::config(format!("Invalid connected flag: {}", e)))?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        if self.auth.anonymous_uid.trim().is_empty() {
            return Err(Error::config("Anonymous uid must not be empty"));
        }

        Ok(())
    }
}

/// Load configuration from the given path, falling back to defaults on any failure
pub fn load_config_or_default(path: Option<&str>) -> Config {
    match path {
        Some(path) => match Config::load(path) {
            Ok(config) => {
                log_info!("Loaded configuration from: {}", path);
                config
            }
            Err(e) => {
                log_warn!("Failed to load config from {}: {}. Using defaults.", path, e);
                Config::default()
            }
        },
        None => {
            log_info!("No config file specified, using defaults");
            Config::default()
        }
    }
}
