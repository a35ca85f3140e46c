//! Port definition for the in-process image cache.

use std::sync::Arc;

use image::DynamicImage;

/// Port for the decoded-image memory tier, keyed by normalized URL.
/// Implementations synchronize internally; callers never lock.
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an image from the cache.
    /// Returns None if not cached.
    fn get(&self, url: &str) -> Option<Arc<DynamicImage>>;

    /// Stores an image, evicting per the implementation's bounded policy.
    fn put(&self, url: &str, image: Arc<DynamicImage>);

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all images from the cache.
    fn clear(&self);
}
