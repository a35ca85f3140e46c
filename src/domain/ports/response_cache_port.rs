//! Port definition for the persistent response cache.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::CachePolicy;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Cache location could not be determined.
    #[error("cache directory not found")]
    DirectoryNotFound,
}

/// Port for the on-disk store of raw response bodies, keyed by URL.
#[async_trait]
pub trait ResponseCachePort: Send + Sync {
    /// Returns the stored body if present and still fresh.
    async fn get(&self, url: &str) -> Option<Bytes>;

    /// Stores a body according to the response's cache policy.
    async fn put(&self, url: &str, body: &[u8], policy: CachePolicy) -> CacheResult<()>;

    /// Removes a stored body.
    async fn evict(&self, url: &str);

    /// Removes every stored body.
    async fn clear(&self) -> CacheResult<()>;
}
