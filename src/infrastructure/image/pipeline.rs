//! Wires the cache tiers and the HTTP transport into a resolver.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use super::disk_cache::DiskResponseCache;
use super::http_fetcher::HttpImageFetcher;
use super::memory_cache::MemoryImageCache;
use crate::application::services::{FetchController, FetchControllerConfig};
use crate::application::use_cases::ThumbnailResolver;
use crate::domain::entities::CachePolicy;
use crate::domain::errors::FetchError;
use crate::domain::ports::{CacheError, CacheResult, ResponseCachePort};
use crate::infrastructure::config::{AppConfig, FetchConfig};

/// Startup failures while assembling the pipeline.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PipelineError {
    #[error("response cache unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("HTTP client unavailable: {0}")]
    Http(#[from] FetchError),
}

/// Response cache used when persistence is switched off. Stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledResponseCache;

#[async_trait]
impl ResponseCachePort for DisabledResponseCache {
    async fn get(&self, _url: &str) -> Option<Bytes> {
        None
    }

    async fn put(&self, _url: &str, _body: &[u8], _policy: CachePolicy) -> CacheResult<()> {
        Ok(())
    }

    async fn evict(&self, _url: &str) {}

    async fn clear(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// Maps the `[fetch]` section onto the controller's tuning.
#[must_use]
pub fn controller_config(fetch: &FetchConfig) -> FetchControllerConfig {
    FetchControllerConfig {
        retry_delay: fetch.retry_delay(),
        max_concurrent_fetches: fetch.max_concurrent,
        max_decoded_width: fetch.max_decoded_width,
    }
}

/// A fully assembled resolver plus handles on its concrete tiers.
#[derive(Debug)]
pub struct ThumbnailPipeline {
    resolver: ThumbnailResolver,
    memory_cache: Arc<MemoryImageCache>,
    response_cache: Option<Arc<DiskResponseCache>>,
}

impl ThumbnailPipeline {
    /// Builds the memory tier, the persistent tier (unless disabled) and the
    /// HTTP transport from `config`.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created or the HTTP
    /// client cannot be built.
    pub async fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let fetcher = HttpImageFetcher::new(config.fetch.timeout())?;
        let response_cache = open_response_cache(config).await?;
        Ok(Self::assemble(config, Arc::new(fetcher), response_cache))
    }

    fn assemble(
        config: &AppConfig,
        fetcher: Arc<HttpImageFetcher>,
        response_cache: Option<Arc<DiskResponseCache>>,
    ) -> Self {
        let memory_cache = Arc::new(MemoryImageCache::new(config.cache.memory_capacity));
        let persistent: Arc<dyn ResponseCachePort> = match &response_cache {
            Some(disk) => disk.clone(),
            None => Arc::new(DisabledResponseCache),
        };

        let controller = FetchController::new(
            memory_cache.clone(),
            persistent,
            fetcher,
            controller_config(&config.fetch),
        );

        Self {
            resolver: ThumbnailResolver::new(Arc::new(controller)),
            memory_cache,
            response_cache,
        }
    }

    /// The resolver to hand to display code.
    #[must_use]
    pub const fn resolver(&self) -> &ThumbnailResolver {
        &self.resolver
    }

    /// The memory tier.
    #[must_use]
    pub const fn memory_cache(&self) -> &Arc<MemoryImageCache> {
        &self.memory_cache
    }

    /// The persistent tier, if enabled.
    #[must_use]
    pub const fn response_cache(&self) -> Option<&Arc<DiskResponseCache>> {
        self.response_cache.as_ref()
    }
}

/// Opens the on-disk tier. A missing platform cache directory disables it
/// instead of failing.
///
/// # Errors
/// Returns error if the directory exists but cannot be used.
pub async fn open_response_cache(
    config: &AppConfig,
) -> Result<Option<Arc<DiskResponseCache>>, CacheError> {
    if !config.cache.persistent {
        debug!("Persistent response cache disabled");
        return Ok(None);
    }
    let Some(dir) = config.cache.effective_directory() else {
        warn!("No cache directory available, running without persistent cache");
        return Ok(None);
    };
    let cache =
        DiskResponseCache::new(dir, config.cache.disk_max_bytes(), config.cache.disk_ttl()).await?;
    Ok(Some(Arc::new(cache)))
}
