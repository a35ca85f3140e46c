//! Domain types for resolved images.

use std::sync::Arc;

use image::DynamicImage;

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served from the in-process memory cache.
    MemoryCache,
    /// Served from the persistent response cache.
    ResponseCache,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::ResponseCache => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A decoded image bound to the candidate URL that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Normalized URL of the winning candidate.
    pub url: String,
    /// Decoded image data.
    pub image: Arc<DynamicImage>,
    /// Cache tier or network.
    pub source: ImageSource,
}

impl ResolvedImage {
    /// Creates a resolved image.
    #[must_use]
    pub fn new(url: impl Into<String>, image: Arc<DynamicImage>, source: ImageSource) -> Self {
        Self {
            url: url.into(),
            image,
            source,
        }
    }
}

/// What a display slot should show for a thumbnail.
#[derive(Debug, Clone)]
pub enum ThumbnailView {
    /// Resolution is in progress.
    Loading,
    /// A decoded image is available.
    Image(Arc<DynamicImage>),
    /// Resolution reached a terminal failure; show the failure placeholder.
    Failed,
}

impl ThumbnailView {
    /// Returns true for the loading placeholder.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the image if one is bound.
    #[must_use]
    pub const fn image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            Self::Image(img) => Some(img),
            _ => None,
        }
    }
}
