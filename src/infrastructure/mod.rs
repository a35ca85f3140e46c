//! Infrastructure layer with cache, transport and configuration adapters.

/// Application configuration.
pub mod config;
/// Image handling (memory tier, persistent response cache, HTTP transport).
pub mod image;

pub use config::{AppConfig, CliArgs, Command, ConfigError, LogLevel, StorageManager};
pub use self::image::{
    CacheStats, DiskResponseCache, HttpImageFetcher, MemoryImageCache, PipelineError,
    ThumbnailPipeline,
};
