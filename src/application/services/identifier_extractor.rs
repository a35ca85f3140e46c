//! Derives a video identifier from the common reference forms.

use url::Url;

use crate::domain::entities::{
    EMBED_SEGMENTS, PLAYBACK_HOSTS, SHORT_LINK_HOSTS, VIDEO_QUERY_PARAM,
};

/// Extracts the media identifier from a raw reference.
///
/// Tries, in order: the `v` query parameter of a playback page, the last path
/// segment of a short link, and the segment following an embed-style segment.
/// Anything else is returned trimmed as a bare identifier without validation.
/// Returns an empty string only for empty or whitespace-only input.
#[must_use]
pub fn extract_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(url) = Url::parse(trimmed)
        && let Some(id) = identifier_from_url(&url)
    {
        return id;
    }

    trimmed.to_string()
}

/// Applies the URL-shaped extraction rules only. Returns None when no rule matched.
pub(crate) fn identifier_from_url(url: &Url) -> Option<String> {
    let host = url.host_str().unwrap_or_default();

    if PLAYBACK_HOSTS.contains(&host)
        && let Some((_, id)) = url
            .query_pairs()
            .find(|(name, value)| name == VIDEO_QUERY_PARAM && !value.is_empty())
    {
        return Some(id.into_owned());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if SHORT_LINK_HOSTS.contains(&host)
        && let Some(last) = segments.last()
    {
        return Some((*last).to_string());
    }

    segments
        .iter()
        .position(|segment| EMBED_SEGMENTS.contains(segment))
        .and_then(|i| segments.get(i + 1))
        .map(|id| (*id).to_string())
}
