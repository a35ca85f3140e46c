//! Domain entities.

mod cache_policy;
mod candidate;
mod image;
mod media_host;
mod quality;

pub use cache_policy::CachePolicy;
pub use candidate::{CandidateChain, CandidateUrl};
pub use self::image::{ImageSource, ResolvedImage, ThumbnailView};
pub use media_host::{
    CANONICAL_NAMESPACE, EMBED_SEGMENTS, IMAGE_EXTENSION, IMAGE_NAMESPACES, ImageHost,
    PLAYBACK_HOSTS, SHORT_LINK_HOSTS, VIDEO_QUERY_PARAM, is_video_host,
};
pub use quality::QualityLevel;
