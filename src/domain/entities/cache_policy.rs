//! Storage policy derived from an HTTP response's `Cache-Control` header.

use std::time::Duration;

/// How long a fetched response may be kept in the persistent cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// The response must not be persisted.
    NoStore,
    /// The response stays fresh for the given duration.
    MaxAge(Duration),
    /// No directive; the cache applies its own default lifetime.
    #[default]
    Unspecified,
}

impl CachePolicy {
    /// Parses a `Cache-Control` header value.
    ///
    /// `no-store` wins over any `max-age`. Unknown directives are ignored.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Unspecified;
        };

        let mut policy = Self::Unspecified;
        for directive in value.split(',').map(str::trim) {
            if directive.eq_ignore_ascii_case("no-store") {
                return Self::NoStore;
            }
            let Some((name, seconds)) = directive.split_once('=') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("max-age")
                && let Ok(secs) = seconds.trim().trim_matches('"').parse::<u64>()
            {
                policy = Self::MaxAge(Duration::from_secs(secs));
            }
        }
        policy
    }

    /// Lifetime to persist with, or None if the response must not be stored.
    #[must_use]
    pub fn ttl(self, default_ttl: Duration) -> Option<Duration> {
        match self {
            Self::NoStore => None,
            Self::MaxAge(age) if age.is_zero() => None,
            Self::MaxAge(age) => Some(age),
            Self::Unspecified => Some(default_ttl),
        }
    }
}
