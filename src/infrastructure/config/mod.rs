//! Application configuration.

/// `config.toml` model and CLI overrides.
pub mod app_config;
/// Command-line arguments.
pub mod args;
/// Loading and saving the config file.
pub mod storage;

pub use app_config::{AppConfig, CacheConfig, FetchConfig, LogLevel};
pub use args::{CliArgs, Command};
pub use storage::{ConfigError, StorageManager};
