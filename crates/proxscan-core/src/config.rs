//! Application configuration management.
//!
//! Handles loading, saving, and validating proxscan configuration including:
//! - How long a fresh scan may wait for the platform
//! - Which platform backend to drive, and on which interface
//! - Where the HTTP server listens

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "PROXSCAN_CONFIG";

/// Bounds for [`ScanConfig::wait_timeout_secs`].
pub const MIN_WAIT_TIMEOUT_SECS: u64 = 1;
/// Bounds for [`ScanConfig::wait_timeout_secs`].
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 300;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("configuration file not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    WriteError {
        /// Path that was written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A single field holds an invalid value.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted field name, e.g. `scan.wait_timeout_secs`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields hold invalid values.
    #[error("{} configuration errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scan coordination settings.
    pub scan: ScanConfig,
    /// Platform backend settings.
    pub platform: PlatformConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

/// Scan coordination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound on waiting for a platform delivery, in seconds.
    pub wait_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 15,
        }
    }
}

impl ScanConfig {
    /// The wait bound as a [`Duration`].
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Which platform adapter to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformBackend {
    /// NetworkManager via `nmcli`.
    #[default]
    Nmcli,
    /// Scripted platform (requires the `mock-platform` feature).
    Mock,
}

/// Platform backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Adapter to use.
    pub backend: PlatformBackend,
    /// Wireless interface to scan on; all interfaces when unset.
    pub interface: Option<String>,
    /// Delay between requesting a rescan and reading results, in milliseconds.
    pub settle_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: PlatformBackend::default(),
            interface: None,
            settle_ms: 3000,
        }
    }
}

impl PlatformConfig {
    /// The settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:3000`.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is not `ip:port`.
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::ValidationError {
                field: "server.bind_address".to_string(),
                message: format!("'{}' is not a socket address: {e}", self.bind_address),
            })
    }
}

impl Config {
    /// Load and validate configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed or invalid.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        match Self::load(path) {
            Err(ConfigError::NotFound(path)) => {
                tracing::info!(path = %path, "No configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let write_error = |source| ConfigError::WriteError {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_error)
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns the single error, or [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if !(MIN_WAIT_TIMEOUT_SECS..=MAX_WAIT_TIMEOUT_SECS).contains(&self.scan.wait_timeout_secs)
        {
            errors.push(ConfigError::ValidationError {
                field: "scan.wait_timeout_secs".to_string(),
                message: format!(
                    "must be between {MIN_WAIT_TIMEOUT_SECS} and {MAX_WAIT_TIMEOUT_SECS}, got {}",
                    self.scan.wait_timeout_secs
                ),
            });
        }

        if self
            .platform
            .interface
            .as_deref()
            .is_some_and(|i| i.trim().is_empty())
        {
            errors.push(ConfigError::ValidationError {
                field: "platform.interface".to_string(),
                message: "must not be empty; omit it to scan on every interface".to_string(),
            });
        }

        if let Err(e) = self.server.socket_addr() {
            errors.push(e);
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// The configuration file location.
    ///
    /// `PROXSCAN_CONFIG` wins; otherwise `/etc/proxscan/config.toml` on Linux
    /// and the platform config directory elsewhere.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        #[cfg(target_os = "linux")]
        {
            PathBuf::from("/etc/proxscan/config.toml")
        }
        #[cfg(not(target_os = "linux"))]
        {
            directories::ProjectDirs::from("", "", "proxscan").map_or_else(
                || PathBuf::from("config.toml"),
                |dirs| dirs.config_dir().join("config.toml"),
            )
        }
    }
}
