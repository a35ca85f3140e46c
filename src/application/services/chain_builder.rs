//! Builds the ordered, deduplicated list of image URLs to try for a reference.

use tracing::trace;
use url::Url;

use super::identifier_extractor::extract_identifier;
use super::url_normalizer::normalize;
use crate::domain::entities::{
    CandidateChain, CandidateUrl, IMAGE_NAMESPACES, ImageHost, QualityLevel, is_video_host,
};

/// Stems that are often missing server-side and get a high-quality rewrite.
const REWRITE_MARKERS: &[&str] = &["maxresdefault", "sddefault", "default"];

/// Builds the candidate chain for `raw`, most preferred first.
///
/// An http(s) URL on a host other than the video hosts is a direct image URL: it
/// yields the normalized URL first, followed by quality and
/// host rewrites when its path follows the image host layout. Video links and
/// bare identifiers yield `preferred`, then the remaining tiers in fixed order on
/// the primary host, then the high tier on the alternate host. Returns an empty
/// chain when no identifier can be derived.
#[must_use]
pub fn build_chain(raw: &str, preferred: QualityLevel) -> CandidateChain {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CandidateChain::new();
    }

    if let Ok(url) = Url::parse(trimmed)
        && matches!(url.scheme(), "http" | "https")
        && !url.host_str().is_some_and(is_video_host)
    {
        return direct_image_chain(trimmed);
    }

    let id = extract_identifier(trimmed);
    if !is_usable_identifier(&id) {
        trace!(reference = %trimmed, "No usable identifier");
        return CandidateChain::new();
    }

    identifier_chain(&id, preferred)
}

/// An identifier must fit in a single path segment.
fn is_usable_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '\\'))
}

fn identifier_chain(id: &str, preferred: QualityLevel) -> CandidateChain {
    let mut chain = CandidateChain::new();
    chain.push(CandidateUrl::for_quality(
        ImageHost::Primary.image_url(id, preferred),
        preferred,
    ));
    for quality in QualityLevel::ALL {
        chain.push(CandidateUrl::for_quality(
            ImageHost::Primary.image_url(id, quality),
            quality,
        ));
    }
    append_canonical_fallbacks(&mut chain, id);
    chain
}

fn direct_image_chain(raw: &str) -> CandidateChain {
    let normalized = normalize(raw);
    let mut chain = CandidateChain::new();

    let Ok(url) = Url::parse(&normalized) else {
        chain.push(CandidateUrl::direct(normalized, None));
        return chain;
    };
    chain.push(CandidateUrl::direct(normalized, quality_of(&url)));

    if let Some(rewritten) = rewrite_quality_marker(&url) {
        chain.push(CandidateUrl::direct(
            rewritten.to_string(),
            Some(QualityLevel::High),
        ));
        if let Some(swapped) = swap_host(&url) {
            chain.push(CandidateUrl::direct(swapped.to_string(), quality_of(&url)));
        }
        if let Some(swapped) = swap_host(&rewritten) {
            chain.push(CandidateUrl::direct(
                swapped.to_string(),
                Some(QualityLevel::High),
            ));
        }
    }

    if let Some(id) = image_path_identifier(&url) {
        append_canonical_fallbacks(&mut chain, &id);
    }

    chain
}

/// High tier on both hosts, whatever the earlier heuristics produced.
fn append_canonical_fallbacks(chain: &mut CandidateChain, id: &str) {
    for host in [ImageHost::Primary, ImageHost::Alternate] {
        chain.push(CandidateUrl::for_quality(
            host.image_url(id, QualityLevel::High),
            QualityLevel::High,
        ));
    }
}

fn file_stem_and_ext(url: &Url) -> Option<(&str, &str)> {
    let file = url.path_segments()?.next_back()?;
    file.rsplit_once('.')
}

fn quality_of(url: &Url) -> Option<QualityLevel> {
    file_stem_and_ext(url).and_then(|(stem, _)| QualityLevel::from_token(stem))
}

fn rewrite_quality_marker(url: &Url) -> Option<Url> {
    let (stem, ext) = file_stem_and_ext(url)?;
    if !REWRITE_MARKERS.contains(&stem) {
        return None;
    }
    let dir = url.path().rsplit_once('/').map_or("", |(dir, _)| dir);
    let mut rewritten = url.clone();
    rewritten.set_path(&format!("{dir}/{}.{ext}", QualityLevel::High.token()));
    Some(rewritten)
}

fn swap_host(url: &Url) -> Option<Url> {
    let host = ImageHost::from_domain(url.host_str()?)?;
    let mut swapped = url.clone();
    swapped.set_host(Some(host.swapped().domain())).ok()?;
    Some(swapped)
}

/// Finds `<namespace>/<id>/<file>` in the path.
fn image_path_identifier(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments.windows(3).find_map(|window| {
        let [namespace, id, file] = window else {
            return None;
        };
        (IMAGE_NAMESPACES.contains(namespace) && !id.is_empty() && !file.is_empty())
            .then(|| (*id).to_string())
    })
}
