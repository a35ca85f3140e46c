//! Naming conventions of the video and image hosts.
//!
//! Images live at `https://<host>/<namespace>/<id>/<quality-token>.<ext>`.

use super::QualityLevel;

/// Hosts serving canonical playback pages (`/watch?v=<id>`).
pub const PLAYBACK_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Hosts serving short share links (`/<id>`).
pub const SHORT_LINK_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path segments that are followed by the video id.
pub const EMBED_SEGMENTS: &[&str] = &["embed", "shorts", "live"];

/// Query parameter naming the video on playback pages.
pub const VIDEO_QUERY_PARAM: &str = "v";

/// Path namespaces used by the image hosts.
pub const IMAGE_NAMESPACES: &[&str] = &["vi", "vi_webp"];

/// Namespace used when building canonical URLs.
pub const CANONICAL_NAMESPACE: &str = "vi";

/// Extension used when building canonical URLs.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Returns true if `host` serves playback pages or short links.
#[must_use]
pub fn is_video_host(host: &str) -> bool {
    PLAYBACK_HOSTS.contains(&host) || SHORT_LINK_HOSTS.contains(&host)
}

/// The two hosts serving the same image tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageHost {
    /// Canonical image host.
    Primary,
    /// Mirror used when the primary fails.
    Alternate,
}

impl ImageHost {
    /// Returns the host name.
    #[must_use]
    pub const fn domain(self) -> &'static str {
        match self {
            Self::Primary => "img.youtube.com",
            Self::Alternate => "i.ytimg.com",
        }
    }

    /// Returns the other host.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Primary => Self::Alternate,
            Self::Alternate => Self::Primary,
        }
    }

    /// Recognizes a host name.
    #[must_use]
    pub fn from_domain(domain: &str) -> Option<Self> {
        [Self::Primary, Self::Alternate]
            .into_iter()
            .find(|host| host.domain().eq_ignore_ascii_case(domain))
    }

    /// Builds the canonical image URL for `id` at `quality` on this host.
    #[must_use]
    pub fn image_url(self, id: &str, quality: QualityLevel) -> String {
        format!(
            "https://{}/{CANONICAL_NAMESPACE}/{id}/{}.{IMAGE_EXTENSION}",
            self.domain(),
            quality.token()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        assert_eq!(
            ImageHost::Primary.image_url("abc123", QualityLevel::Max),
            "https://img.youtube.com/vi/abc123/maxresdefault.jpg"
        );
        assert_eq!(
            ImageHost::Alternate.image_url("abc123", QualityLevel::Low),
            "https://i.ytimg.com/vi/abc123/default.jpg"
        );
    }

    #[test]
    fn test_host_swap() {
        assert_eq!(ImageHost::from_domain("I.YTIMG.COM"), Some(ImageHost::Alternate));
        assert_eq!(ImageHost::Primary.swapped(), ImageHost::Alternate);
        assert_eq!(ImageHost::from_domain("example.com"), None);
    }

    #[test]
    fn test_is_video_host() {
        assert!(is_video_host("youtu.be"));
        assert!(is_video_host("m.youtube.com"));
        assert!(!is_video_host("img.youtube.com"));
    }
}
