//! Best-effort URL canonicalization.

use url::Url;

/// Query parameters that never change the served image: cache busters and tracking.
const VOLATILE_PARAMS: &[&str] = &[
    "_",
    "t",
    "ts",
    "timestamp",
    "cb",
    "cachebust",
    "cache_bust",
    "nocache",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
];

/// Normalizes a raw URL string.
///
/// Trims whitespace, upgrades `http` to `https` and drops volatile query
/// parameters (matched case-insensitively by name). Input that does not parse
/// as a URL is returned trimmed and otherwise untouched. Idempotent.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    if url.scheme() == "http" && url.set_scheme("https").is_err() {
        return trimmed.to_string();
    }

    if let Some(query) = url.query() {
        let kept = query
            .split('&')
            .filter(|pair| !pair.is_empty() && !is_volatile(pair))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query((!kept.is_empty()).then_some(kept.as_str()));
    }

    url.to_string()
}

fn is_volatile(pair: &str) -> bool {
    let name = pair.split_once('=').map_or(pair, |(name, _)| name);
    VOLATILE_PARAMS
        .iter()
        .any(|volatile| volatile.eq_ignore_ascii_case(name))
}
