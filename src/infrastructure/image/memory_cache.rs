//! In-memory LRU cache of decoded thumbnails.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::ports::ImageCachePort;

/// Default maximum number of decoded images held in memory.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Bounded, process-wide cache of decoded images keyed by normalized URL.
///
/// The lock is never held across an await point, so a plain mutex is enough
/// and lookups stay callable from synchronous code.
pub struct MemoryImageCache {
    cache: Mutex<LruCache<String, Arc<DynamicImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a cache holding at most `capacity` images. Zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with [`DEFAULT_CACHE_SIZE`].
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Returns hit/miss counters and current size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }

    /// Looks up an image without promoting it or touching the counters.
    #[must_use]
    pub fn peek(&self, url: &str) -> Option<Arc<DynamicImage>> {
        self.cache.lock().peek(url).cloned()
    }

    /// Returns true if `url` is cached. Does not affect recency.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.cache.lock().contains(url)
    }

    /// Drops a single entry.
    pub fn evict(&self, url: &str) {
        if self.cache.lock().pop(url).is_some() {
            debug!(url = %url, "Evicted image from memory cache");
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

impl ImageCachePort for MemoryImageCache {
    fn get(&self, url: &str) -> Option<Arc<DynamicImage>> {
        let mut cache = self.cache.lock();
        if let Some(img) = cache.get(url) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Memory cache miss");
            None
        }
    }

    fn put(&self, url: &str, image: Arc<DynamicImage>) {
        let mut cache = self.cache.lock();
        if let Some((evicted, _)) = cache.push(url.to_string(), image)
            && evicted != url
        {
            trace!(url = %evicted, "Memory cache evicted least recently used");
        }
        debug!(url = %url, size = cache.len(), "Stored image in memory cache");
    }

    fn len(&self) -> usize {
        self.cache.lock().len()
    }

    fn clear(&self) {
        self.cache.lock().clear();
        debug!("Cleared memory image cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(width: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::new_rgb8(width, 10))
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = MemoryImageCache::new(10);
        cache.put("https://a.test/1.jpg", img(100));

        let retrieved = cache.get("https://a.test/1.jpg");
        assert_eq!(retrieved.unwrap().width(), 100);
        assert!(cache.get("https://a.test/missing.jpg").is_none());
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = MemoryImageCache::new(2);
        cache.put("1", img(1));
        cache.put("2", img(2));
        // touch 1 so 2 becomes the eviction victim
        let _ = cache.get("1");
        cache.put("3", img(3));

        assert!(cache.contains("1"));
        assert!(!cache.contains("2"));
        assert!(cache.contains("3"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replacing_an_entry_keeps_size() {
        let cache = MemoryImageCache::new(4);
        cache.put("1", img(1));
        cache.put("1", img(7));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek("1").unwrap().width(), 7);
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryImageCache::new(10);
        cache.put("1", img(1));

        let _ = cache.get("1");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!(stats.to_string().contains("50.0% hit rate"));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = MemoryImageCache::new(2);
        cache.put("1", img(1));
        cache.put("2", img(2));

        let _ = cache.peek("1");
        cache.put("3", img(3));

        assert!(cache.peek("1").is_none());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = MemoryImageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put("1", img(1));
        cache.put("2", img(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(MemoryImageCache::new(16));

        std::thread::scope(|scope| {
            for worker in 0..8u32 {
                let cache = cache.clone();
                scope.spawn(move || {
                    for i in 0..50u32 {
                        let url = format!("https://a.test/{}.jpg", (worker * 50 + i) % 24);
                        cache.put(&url, img(worker + 1));
                        let _ = cache.get(&url);
                    }
                });
            }
        });

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 400);
        assert!(cache.len() <= 16);
        assert_eq!(stats.size, cache.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_across_tasks() {
        let cache = Arc::new(MemoryImageCache::new(8));

        let mut tasks = Vec::new();
        for worker in 0..8u32 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                let url = format!("https://a.test/{worker}.jpg");
                cache.put(&url, img(worker + 1));
                tokio::task::yield_now().await;
                cache.peek(&url).map(|image| image.width())
            }));
        }

        for task in tasks {
            let width = task.await.unwrap();
            assert!(width.is_none_or(|w| (1..=8).contains(&w)));
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_clear_and_evict() {
        let cache = MemoryImageCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CACHE_SIZE);
        cache.put("1", img(1));
        cache.put("2", img(2));

        cache.evict("1");
        assert!(!cache.contains("1"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
