//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching of decoded images with LRU eviction
//! - A persistent response cache honoring `Cache-Control`
//! - The HTTP transport
//! - Assembly of the above into a [`ThumbnailPipeline`]

pub mod disk_cache;
pub mod http_fetcher;
pub mod memory_cache;
pub mod pipeline;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_TTL, DiskResponseCache, default_cache_dir};
pub use http_fetcher::{DEFAULT_TIMEOUT, HttpImageFetcher};
pub use memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryImageCache};
pub use pipeline::{
    DisabledResponseCache, PipelineError, ThumbnailPipeline, controller_config,
    open_response_cache,
};
