//! Disk-backed store of raw thumbnail responses, persisted across runs.
//!
//! Each entry is one `<key>.img` file: a 12-byte header (magic plus the expiry
//! as big-endian unix seconds) followed by the body exactly as received.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::CachePolicy;
use crate::domain::ports::{CacheError, CacheResult, ResponseCachePort};

/// Maximum disk cache size in bytes (200 MiB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

/// Lifetime for responses that carry no `max-age`.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const ENTRY_EXTENSION: &str = "img";
const MAGIC: &[u8; 4] = b"TLC1";
const HEADER_LEN: usize = MAGIC.len() + 8;

/// Persistent response cache keyed by a hash of the normalized URL.
///
/// Writes are staged in a temporary file and renamed into place. Renames,
/// removals and the size bookkeeping happen under `write_lock`, so the
/// counters match the directory even when attempts race on one URL.
#[derive(Debug)]
pub struct DiskResponseCache {
    cache_dir: PathBuf,
    max_size: u64,
    default_ttl: Duration,
    current_size: AtomicU64,
    item_count: AtomicUsize,
    write_lock: Mutex<()>,
}

impl DiskResponseCache {
    /// Opens (creating if needed) a cache in `cache_dir`.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf, max_size: u64, default_ttl: Duration) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;

        let mut total_size = 0u64;
        let mut count = 0usize;
        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            if is_entry_file(&entry.path())
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        debug!(
            path = %cache_dir.display(),
            entries = count,
            size = total_size,
            "Opened response cache"
        );

        let cache = Self {
            cache_dir,
            max_size,
            default_ttl,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
            write_lock: Mutex::new(()),
        };
        cache.cleanup_if_needed().await;
        Ok(cache)
    }

    /// Opens the cache in the platform cache directory.
    ///
    /// # Errors
    /// Returns error if no cache directory can be determined or created.
    pub async fn default_location(max_size: u64, default_ttl: Duration) -> CacheResult<Self> {
        let cache_dir = default_cache_dir().ok_or(CacheError::DirectoryNotFound)?;
        Self::new(cache_dir, max_size, default_ttl).await
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{ENTRY_EXTENSION}", cache_key(url)))
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if an entry file exists for `url`, fresh or not.
    pub async fn contains(&self, url: &str) -> bool {
        fs::try_exists(self.cache_path(url)).await.unwrap_or(false)
    }

    /// Entries written behind our back may not be counted, so never wrap.
    fn release(&self, size: u64, count: usize) {
        let _ = self
            .current_size
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(size))
            });
        let _ = self
            .item_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(count))
            });
    }

    async fn remove_entry(&self, path: &Path) -> bool {
        let _guard = self.write_lock.lock().await;
        let size = fs::metadata(path).await.map(|m| m.len()).ok();
        match fs::remove_file(path).await {
            Ok(()) => {
                if let Some(s) = size {
                    self.release(s, 1);
                }
                true
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                }
                false
            }
        }
    }

    /// Removes least recently accessed entries once over the size bound,
    /// freeing an extra tenth of the bound.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size,
            max_size = self.max_size,
            "Response cache over limit, cleaning up"
        );

        let _guard = self.write_lock.lock().await;
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }
        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, SystemTime, u64)> = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_entry_file(&path) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let touched = meta
                    .accessed()
                    .or_else(|_| meta.modified())
                    .unwrap_or(UNIX_EPOCH);
                files.push((path, touched, meta.len()));
            }
        }
        files.sort_by_key(|(_, time, _)| *time);

        let target = current_size - self.max_size + (self.max_size / 10);
        let mut freed_size = 0u64;
        let mut freed_count = 0usize;

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                trace!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        self.release(freed_size, freed_count);

        debug!(freed_size, freed_count, "Response cache cleanup complete");
    }

    /// Writes header and body to a temporary file in the cache directory.
    async fn stage(&self, expires_at: u64, body: &[u8]) -> CacheResult<NamedTempFile> {
        let dir = self.cache_dir.clone();
        let mut contents = Vec::with_capacity(HEADER_LEN + body.len());
        contents.extend_from_slice(&encode_header(expires_at));
        contents.extend_from_slice(body);

        tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = NamedTempFile::new_in(&dir)?;
            file.write_all(&contents)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| CacheError::IoError(format!("Cache write task failed: {e}")))?
        .map_err(|e| CacheError::IoError(format!("Failed to write cache file: {e}")))
    }
}

#[async_trait]
impl ResponseCachePort for DiskResponseCache {
    async fn get(&self, url: &str) -> Option<Bytes> {
        let path = self.cache_path(url);
        let Ok(raw) = fs::read(&path).await else {
            trace!(url = %url, "Response cache miss");
            return None;
        };

        let Some(expires_at) = parse_header(&raw) else {
            warn!(url = %url, path = %path.display(), "Discarding malformed cache entry");
            self.remove_entry(&path).await;
            return None;
        };

        if expires_at <= unix_now() {
            trace!(url = %url, "Response cache entry expired");
            self.remove_entry(&path).await;
            return None;
        }

        trace!(url = %url, path = %path.display(), "Response cache hit");
        Some(Bytes::from(raw).slice(HEADER_LEN..))
    }

    async fn put(&self, url: &str, body: &[u8], policy: CachePolicy) -> CacheResult<()> {
        let path = self.cache_path(url);
        let Some(ttl) = policy.ttl(self.default_ttl) else {
            trace!(url = %url, ?policy, "Response not cacheable");
            self.remove_entry(&path).await;
            return Ok(());
        };

        let expires_at = unix_now().saturating_add(ttl.as_secs());
        let staged = self.stage(expires_at, body).await?;
        let new_size = (HEADER_LEN + body.len()) as u64;

        {
            let _guard = self.write_lock.lock().await;
            let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();
            staged.persist(&path).map_err(|e| {
                CacheError::IoError(format!("Failed to persist cache file: {}", e.error))
            })?;

            match old_size {
                Some(old) => self.release(old, 0),
                None => {
                    self.item_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
        }

        debug!(
            url = %url,
            size = body.len(),
            ttl_secs = ttl.as_secs(),
            "Stored response in cache"
        );

        self.cleanup_if_needed().await;
        Ok(())
    }

    async fn evict(&self, url: &str) {
        if self.remove_entry(&self.cache_path(url)).await {
            debug!(url = %url, "Evicted from response cache");
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            if is_entry_file(&path) && fs::remove_file(&path).await.is_err() {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!(path = %self.cache_dir.display(), "Cleared response cache");
        Ok(())
    }
}

/// Platform cache directory for thumbnails, if the platform has one.
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "thumbline", crate::NAME)
        .map(|dirs| dirs.cache_dir().join("thumbnails"))
}

/// File stem for `url`: the first 16 bytes of its SHA-256, hex encoded.
fn cache_key(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..16])
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn encode_header(expires_at: u64) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC.len()].copy_from_slice(MAGIC);
    header[MAGIC.len()..].copy_from_slice(&expires_at.to_be_bytes());
    header
}

fn parse_header(raw: &[u8]) -> Option<u64> {
    let header = raw.get(..HEADER_LEN)?;
    let (magic, expiry) = header.split_at(MAGIC.len());
    if magic != MAGIC {
        return None;
    }
    Some(u64::from_be_bytes(expiry.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL_A: &str = "https://img.youtube.com/vi/abc/hqdefault.jpg";
    const URL_B: &str = "https://i.ytimg.com/vi/abc/hqdefault.jpg";

    async fn create_test_cache() -> (DiskResponseCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskResponseCache::new(temp_dir.path().to_path_buf(), 1024 * 1024, DEFAULT_TTL)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    #[test]
    fn test_cache_key_is_stable_hex() {
        let key = cache_key(URL_A);
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key(URL_A));
        assert_ne!(key, cache_key(URL_B));
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (cache, _temp) = create_test_cache().await;

        cache
            .put(URL_A, b"image data", CachePolicy::Unspecified)
            .await
            .unwrap();

        assert_eq!(cache.get(URL_A).await.unwrap().as_ref(), b"image data");
        assert!(cache.get(URL_B).await.is_none());
    }

    #[tokio::test]
    async fn test_no_store_is_not_persisted() {
        let (cache, _temp) = create_test_cache().await;

        cache.put(URL_A, b"old", CachePolicy::Unspecified).await.unwrap();
        cache.put(URL_A, b"new", CachePolicy::NoStore).await.unwrap();

        assert!(!cache.contains(URL_A).await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_age_is_not_persisted() {
        let (cache, _temp) = create_test_cache().await;

        cache
            .put(URL_A, b"data", CachePolicy::MaxAge(Duration::ZERO))
            .await
            .unwrap();

        assert!(!cache.contains(URL_A).await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_removed() {
        let (cache, _temp) = create_test_cache().await;
        cache.put(URL_A, b"fresh", CachePolicy::Unspecified).await.unwrap();

        let mut stale = encode_header(unix_now() - 1).to_vec();
        stale.extend_from_slice(b"stale");
        std::fs::write(cache.cache_path(URL_A), stale).unwrap();

        assert!(cache.get(URL_A).await.is_none());
        assert!(!cache.contains(URL_A).await);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_discarded() {
        let (cache, _temp) = create_test_cache().await;
        std::fs::write(cache.cache_path(URL_A), b"junk").unwrap();

        assert!(cache.get(URL_A).await.is_none());
        assert!(!cache.contains(URL_A).await);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.current_size(), 0);
    }

    #[tokio::test]
    async fn test_max_age_sets_expiry() {
        let (cache, _temp) = create_test_cache().await;
        cache
            .put(URL_A, b"x", CachePolicy::MaxAge(Duration::from_secs(60)))
            .await
            .unwrap();

        let raw = std::fs::read(cache.cache_path(URL_A)).unwrap();
        let expires_at = parse_header(&raw).unwrap();
        let now = unix_now();
        assert!(expires_at > now && expires_at <= now + 60);
    }

    #[tokio::test]
    async fn test_evict_and_clear() {
        let (cache, _temp) = create_test_cache().await;
        cache.put(URL_A, b"1", CachePolicy::Unspecified).await.unwrap();
        cache.put(URL_B, b"2", CachePolicy::Unspecified).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.evict(URL_A).await;
        assert!(!cache.contains(URL_A).await);
        assert_eq!(cache.len(), 1);

        cache.clear().await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.current_size(), 0);
    }

    #[tokio::test]
    async fn test_counters_track_header_and_body() {
        let (cache, _temp) = create_test_cache().await;

        cache.put(URL_A, b"hello", CachePolicy::Unspecified).await.unwrap();
        cache.put(URL_B, b"world!", CachePolicy::Unspecified).await.unwrap();
        assert_eq!(cache.current_size(), (2 * HEADER_LEN + 11) as u64);

        cache.put(URL_A, b"hey", CachePolicy::Unspecified).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), (2 * HEADER_LEN + 9) as u64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_to_one_url_count_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(
            DiskResponseCache::new(temp_dir.path().to_path_buf(), 64 * 1024 * 1024, DEFAULT_TTL)
                .await
                .unwrap(),
        );
        let body = vec![7u8; 64 * 1024];

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let body = body.clone();
            tasks.push(tokio::spawn(async move {
                cache.put(URL_A, &body, CachePolicy::Unspecified).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(names.len(), 1, "staged files left behind: {names:?}");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), (HEADER_LEN + body.len()) as u64);
        assert_eq!(cache.get(URL_A).await.unwrap().as_ref(), body.as_slice());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_racing_puts_never_wraps_size() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(
            DiskResponseCache::new(temp_dir.path().to_path_buf(), 64 * 1024 * 1024, DEFAULT_TTL)
                .await
                .unwrap(),
        );
        cache.put(URL_A, &[1u8; 4096], CachePolicy::Unspecified).await.unwrap();

        let writer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    cache.put(URL_A, b"small", CachePolicy::Unspecified).await.unwrap();
                }
            })
        };
        for _ in 0..20 {
            cache.clear().await.unwrap();
        }
        writer.await.unwrap();

        let on_disk: u64 = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().metadata().unwrap().len())
            .sum();
        assert_eq!(cache.current_size(), on_disk);
        assert!(cache.len() <= 1);
    }

    #[tokio::test]
    async fn test_reopen_counts_existing_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();
        {
            let cache = DiskResponseCache::new(path.clone(), 1024, DEFAULT_TTL).await.unwrap();
            cache.put(URL_A, b"abc", CachePolicy::Unspecified).await.unwrap();
        }
        std::fs::write(path.join("notes.txt"), b"ignored").unwrap();

        let reopened = DiskResponseCache::new(path, 1024, DEFAULT_TTL).await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(URL_A).await.unwrap().as_ref(), b"abc");
    }

    #[tokio::test]
    async fn test_cleanup_enforces_size_bound() {
        let temp_dir = TempDir::new().unwrap();
        let bound = (HEADER_LEN + 10) as u64;
        let cache = DiskResponseCache::new(temp_dir.path().to_path_buf(), bound, DEFAULT_TTL)
            .await
            .unwrap();

        cache.put(URL_A, b"123456", CachePolicy::Unspecified).await.unwrap();
        cache.put(URL_B, b"123456", CachePolicy::Unspecified).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.current_size() <= bound);
    }
}
