//! Candidate URLs and the ordered chain tried for one resolution.

use super::QualityLevel;

/// A fully qualified, normalized image URL to try.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateUrl {
    url: String,
    quality: Option<QualityLevel>,
}

impl CandidateUrl {
    /// Creates a candidate derived from an identifier at a given tier.
    #[must_use]
    pub fn for_quality(url: impl Into<String>, quality: QualityLevel) -> Self {
        Self {
            url: url.into(),
            quality: Some(quality),
        }
    }

    /// Creates a candidate from a caller-supplied or rewritten URL.
    #[must_use]
    pub fn direct(url: impl Into<String>, quality: Option<QualityLevel>) -> Self {
        Self {
            url: url.into(),
            quality,
        }
    }

    /// Returns the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the tier that produced this URL, if known.
    #[must_use]
    pub const fn quality(&self) -> Option<QualityLevel> {
        self.quality
    }
}

impl std::fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Ordered list of candidates with no duplicate URLs.
///
/// Duplicates are rejected on insertion, so the first occurrence of a URL
/// keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateChain {
    candidates: Vec<CandidateUrl>,
}

impl CandidateChain {
    /// Creates an empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Appends a candidate unless its URL is already present.
    /// Returns true if the candidate was added.
    pub fn push(&mut self, candidate: CandidateUrl) -> bool {
        if self.contains(candidate.url()) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    /// Returns true if a candidate with this URL is present.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.candidates.iter().any(|c| c.url == url)
    }

    /// Returns the candidate at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CandidateUrl> {
        self.candidates.get(index)
    }

    /// Returns the most preferred candidate.
    #[must_use]
    pub fn first(&self) -> Option<&CandidateUrl> {
        self.candidates.first()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if nothing could be derived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterates candidates in preference order.
    pub fn iter(&self) -> std::slice::Iter<'_, CandidateUrl> {
        self.candidates.iter()
    }

    /// Returns the URLs in preference order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        self.candidates.iter().map(CandidateUrl::url).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateChain {
    type Item = &'a CandidateUrl;
    type IntoIter = std::slice::Iter<'a, CandidateUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_duplicates() {
        let mut chain = CandidateChain::new();
        assert!(chain.push(CandidateUrl::direct("https://a.test/1.jpg", None)));
        assert!(chain.push(CandidateUrl::for_quality(
            "https://a.test/2.jpg",
            QualityLevel::High
        )));
        assert!(!chain.push(CandidateUrl::for_quality(
            "https://a.test/1.jpg",
            QualityLevel::Low
        )));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.urls(), vec!["https://a.test/1.jpg", "https://a.test/2.jpg"]);
        assert_eq!(chain.first().and_then(CandidateUrl::quality), None);
    }

    #[test]
    fn test_empty_chain() {
        let chain = CandidateChain::default();
        assert!(chain.is_empty());
        assert!(chain.first().is_none());
        assert!(chain.get(0).is_none());
    }
}
