//! Walks a candidate chain: memory cache, then persistent cache, then network.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::domain::entities::{ImageSource, ResolvedImage};
use crate::domain::errors::FetchError;
use crate::domain::ports::{ImageCachePort, ImageFetcherPort, ResponseCachePort};
use crate::domain::resolution::{ResolutionAttempt, ResolutionState};

/// Tuning for the fetch controller.
#[derive(Debug, Clone)]
pub struct FetchControllerConfig {
    /// Pause between a failed candidate and the next one.
    pub retry_delay: Duration,
    /// Maximum concurrent network fetches across all attempts.
    pub max_concurrent_fetches: usize,
    /// Decoded images wider than this are downscaled before caching.
    pub max_decoded_width: u32,
}

impl Default for FetchControllerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(300),
            max_concurrent_fetches: 4,
            max_decoded_width: 640,
        }
    }
}

/// How a drive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The attempt reached `Succeeded` or `Exhausted`.
    Finished,
    /// The caller cancelled; the attempt's state must be discarded.
    Superseded,
}

/// Drives resolution attempts against the cache tiers and the network.
///
/// Holds no per-attempt state; any number of attempts may be driven
/// concurrently. The memory cache is the only shared mutable state.
pub struct FetchController {
    memory_cache: Arc<dyn ImageCachePort>,
    response_cache: Arc<dyn ResponseCachePort>,
    fetcher: Arc<dyn ImageFetcherPort>,
    semaphore: Arc<Semaphore>,
    config: FetchControllerConfig,
}

impl std::fmt::Debug for FetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FetchController {
    /// Creates a controller over the given tiers.
    #[must_use]
    pub fn new(
        memory_cache: Arc<dyn ImageCachePort>,
        response_cache: Arc<dyn ResponseCachePort>,
        fetcher: Arc<dyn ImageFetcherPort>,
        config: FetchControllerConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        Self {
            memory_cache,
            response_cache,
            fetcher,
            semaphore,
            config,
        }
    }

    /// The shared memory tier.
    #[must_use]
    pub fn memory_cache(&self) -> &Arc<dyn ImageCachePort> {
        &self.memory_cache
    }

    /// The persistent tier.
    #[must_use]
    pub fn response_cache(&self) -> &Arc<dyn ResponseCachePort> {
        &self.response_cache
    }

    /// Runs `attempt` until it is terminal or `cancel` fires.
    ///
    /// Candidates are tried strictly in order. A fetch that has started always
    /// completes and populates the caches; cancellation is observed after it and
    /// during the inter-candidate delay.
    pub async fn drive(
        &self,
        attempt: &mut ResolutionAttempt,
        cancel: &CancellationToken,
    ) -> DriveOutcome {
        loop {
            if cancel.is_cancelled() {
                return DriveOutcome::Superseded;
            }

            let step = match attempt.state() {
                ResolutionState::Idle => attempt.start().map(|_| ()),
                ResolutionState::AttemptingCandidate(index) => {
                    let index = *index;
                    let Some(url) = attempt.current().map(|c| c.url().to_string()) else {
                        error!(index, "Candidate index out of range");
                        return DriveOutcome::Finished;
                    };

                    match self.attempt_candidate(&url).await {
                        Ok(resolved) => {
                            debug!(index, url = %url, source = %resolved.source, "Candidate resolved");
                            attempt.succeed(resolved).map(|_| ())
                        }
                        Err(e) => {
                            debug!(index, url = %url, error = %e, "Candidate failed");
                            attempt.fail().map(|_| ())
                        }
                    }
                }
                ResolutionState::AdvancingCandidate(index) => {
                    if attempt.has_next() {
                        trace!(index, delay = ?self.config.retry_delay, "Waiting before next candidate");
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => return DriveOutcome::Superseded,
                            () = tokio::time::sleep(self.config.retry_delay) => {}
                        }
                    }
                    attempt.advance().map(|_| ())
                }
                ResolutionState::Succeeded(_) | ResolutionState::Exhausted(_) => {
                    return DriveOutcome::Finished;
                }
            };

            if let Err(e) = step {
                error!(error = %e, "Resolution state machine rejected transition");
                return DriveOutcome::Finished;
            }
        }
    }

    /// Resolves one URL through the tiers.
    ///
    /// # Errors
    /// Returns the network or decode failure for this URL.
    pub async fn attempt_candidate(&self, url: &str) -> Result<ResolvedImage, FetchError> {
        if let Some(img) = self.memory_cache.get(url) {
            return Ok(ResolvedImage::new(url, img, ImageSource::MemoryCache));
        }

        if let Some(body) = self.response_cache.get(url).await {
            match self.decode(body).await {
                Ok(img) => {
                    self.memory_cache.put(url, img.clone());
                    return Ok(ResolvedImage::new(url, img, ImageSource::ResponseCache));
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Evicting undecodable cached response");
                    self.response_cache.evict(url).await;
                }
            }
        }

        let response = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| FetchError::transport(format!("fetch limiter closed: {e}")))?;
            trace!(url = %url, "Fetching from network");
            self.fetcher.fetch(url).await?
        };

        if response.body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        let img = self.decode(response.body.clone()).await?;
        self.memory_cache.put(url, img.clone());

        if let Err(e) = self
            .response_cache
            .put(url, &response.body, response.cache_policy)
            .await
        {
            warn!(url = %url, error = %e, "Failed to persist response");
        }

        Ok(ResolvedImage::new(url, img, ImageSource::Network))
    }

    async fn decode(&self, body: Bytes) -> Result<Arc<DynamicImage>, FetchError> {
        let max_width = self.config.max_decoded_width;
        tokio::task::spawn_blocking(move || decode_thumbnail(&body, max_width))
            .await
            .map_err(|e| FetchError::decode(format!("decode task panicked: {e}")))?
            .map(Arc::new)
    }
}

/// Decodes an image payload, downscaling anything wider than `max_width`.
///
/// # Errors
/// Returns a decode error if the payload is not a supported image.
pub fn decode_thumbnail(body: &[u8], max_width: u32) -> Result<DynamicImage, FetchError> {
    let img = image::load_from_memory(body).map_err(|e| FetchError::decode(e.to_string()))?;
    if max_width > 0 && img.width() > max_width {
        Ok(img.resize(
            max_width,
            img.height(),
            image::imageops::FilterType::Triangle,
        ))
    } else {
        Ok(img)
    }
}
