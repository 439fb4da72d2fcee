//! Layered application configuration.
//!
//! Values are resolved in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config PATH`, or `config.toml` in the platform
//!    config directory when present)
//! 3. `DS_*` environment variables (e.g. `DS_HASH_WORKERS=8`)
//! 4. CLI flags
//!
//! ```toml
//! scan_workers = 8
//! hash_workers = 16
//! read_buffer_kib = 256
//! follow_symlinks = false
//! verify_size = true
//! ```

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::actions::OperationConfig;
use crate::cli::Cli;
use crate::scanner::walker::default_scan_workers;
use crate::scanner::{HasherConfig, WalkerConfig, MAX_HASH_WORKERS};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DS_";

/// Largest accepted hash read buffer (64 MiB), allocated once per worker.
pub const MAX_READ_BUFFER_KIB: usize = 64 * 1024;

/// Configuration errors. All are raised before any scanning.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly given config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The file or environment holds values of the wrong type.
    #[error("invalid configuration: {0}")]
    Parse(#[source] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for directory scanning.
    pub scan_workers: usize,
    /// Upper bound on hashing workers (values above 32 are clamped).
    pub hash_workers: usize,
    /// Hash read buffer in KiB (at most 64 MiB).
    pub read_buffer_kib: usize,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Refuse to delete or move files whose size changed since the scan.
    pub verify_size: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_workers: default_scan_workers(),
            hash_workers: MAX_HASH_WORKERS,
            read_buffer_kib: 64,
            follow_symlinks: false,
            verify_size: true,
        }
    }
}

impl Config {
    /// Default platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "data-symmetry", "ds")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration, using `explicit` as the config file if given.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `explicit` does not exist, or a parse or
    /// validation error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from_path(Some(path))
            }
            None => Self::load_from_path(Self::default_path().as_deref()),
        }
    }

    /// Load defaults, then `path` (skipped when missing), then the environment.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error.
    pub fn load_from_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Parse(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(workers) = cli.scan_workers {
            self.scan_workers = workers;
        }
        if let Some(workers) = cli.hash_workers {
            self.hash_workers = workers;
        }
        if cli.follow_symlinks {
            self.follow_symlinks = true;
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("scan_workers", self.scan_workers),
            ("hash_workers", self.hash_workers),
            ("read_buffer_kib", self.read_buffer_kib),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.read_buffer_kib > MAX_READ_BUFFER_KIB {
            return Err(ConfigError::Invalid {
                field: "read_buffer_kib",
                reason: format!("must be at most {}", MAX_READ_BUFFER_KIB),
            });
        }
        if self.hash_workers > MAX_HASH_WORKERS {
            log::warn!(
                "hash_workers = {} exceeds the maximum, using {}",
                self.hash_workers,
                MAX_HASH_WORKERS
            );
        }
        Ok(())
    }

    /// Scanner settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_workers(self.scan_workers)
            .with_follow_symlinks(self.follow_symlinks)
    }

    /// Hasher settings.
    #[must_use]
    pub fn hasher_config(&self) -> HasherConfig {
        HasherConfig::default()
            .with_max_workers(self.hash_workers)
            .with_buffer_size(self.read_buffer_kib.saturating_mul(1024))
    }

    /// Per-file operation settings.
    #[must_use]
    pub fn operation_config(&self) -> OperationConfig {
        OperationConfig::default().with_verify_size(self.verify_size)
    }
}
