//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::domain::entities::QualityLevel;

pub(crate) const APP_NAME: &str = crate::NAME;
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "thumbline";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level.
    #[default]
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from `config.toml` and overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Preferred thumbnail quality.
    #[serde(default)]
    pub quality: QualityLevel,

    /// Cache tiers.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Network behavior.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum decoded images kept in memory.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Enable the on-disk response cache.
    #[serde(default = "default_true")]
    pub persistent: bool,

    /// Override for the on-disk cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Size bound of the on-disk cache in MiB.
    #[serde(default = "default_disk_max_mb")]
    pub disk_max_mb: u64,

    /// Lifetime of responses without `max-age`, in seconds.
    #[serde(default = "default_disk_ttl_secs")]
    pub disk_ttl_secs: u64,
}

impl CacheConfig {
    /// Size bound in bytes.
    #[must_use]
    pub const fn disk_max_bytes(&self) -> u64 {
        self.disk_max_mb.saturating_mul(1024 * 1024)
    }

    /// Default response lifetime.
    #[must_use]
    pub const fn disk_ttl(&self) -> Duration {
        Duration::from_secs(self.disk_ttl_secs)
    }

    /// Configured directory, or the platform cache directory.
    #[must_use]
    pub fn effective_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(crate::infrastructure::image::default_cache_dir)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: default_memory_capacity(),
            persistent: true,
            directory: None,
            disk_max_mb: default_disk_max_mb(),
            disk_ttl_secs: default_disk_ttl_secs(),
        }
    }
}

/// Fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Pause between failed candidates, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum simultaneous network requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Decoded images wider than this are downscaled. 0 disables.
    #[serde(default = "default_max_decoded_width")]
    pub max_decoded_width: u32,
}

impl FetchConfig {
    /// Inter-candidate delay.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            max_decoded_width: default_max_decoded_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_memory_capacity() -> usize {
    100
}

fn default_disk_max_mb() -> u64 {
    200
}

fn default_disk_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_retry_delay_ms() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_decoded_width() -> u32 {
    640
}

impl AppConfig {
    /// Applies every flag the user actually passed.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(quality) = args.command.quality() {
            self.quality = quality;
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.cache.directory = Some(cache_dir.clone());
        }
        if let Some(persistent) = args.persistent_cache {
            self.cache.persistent = persistent;
        }
        if let Some(memory_capacity) = args.memory_capacity {
            self.cache.memory_capacity = memory_capacity;
        }
        if let Some(retry_delay_ms) = args.retry_delay_ms {
            self.fetch.retry_delay_ms = retry_delay_ms;
        }
        if let Some(timeout) = args.timeout {
            self.fetch.timeout_secs = timeout;
        }
        if let Some(max_concurrent) = args.max_concurrent {
            self.fetch.max_concurrent = max_concurrent;
        }
    }

    /// Platform configuration directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Platform configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Explicit config path, or the platform one.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::default(),
            quality: QualityLevel::default(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}
