//! Thumbnail quality tiers.

use serde::{Deserialize, Serialize};

/// Image resolution tier on the canonical image host.
///
/// The declaration order is the fixed fallback order used when building
/// candidate chains: `Max`, `High`, `Medium`, `Low`. A tier is not guaranteed
/// to exist server-side for every video.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Full resolution (`maxresdefault`).
    Max,
    /// High quality (`hqdefault`), present for nearly every video.
    #[default]
    High,
    /// Medium quality (`mqdefault`).
    Medium,
    /// Lowest quality (`default`).
    Low,
}

impl QualityLevel {
    /// All tiers in fallback order.
    pub const ALL: [Self; 4] = [Self::Max, Self::High, Self::Medium, Self::Low];

    /// File stem used by the canonical image host for this tier.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Max => "maxresdefault",
            Self::High => "hqdefault",
            Self::Medium => "mqdefault",
            Self::Low => "default",
        }
    }

    /// Maps a file stem back to its tier.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.token() == token)
    }

    /// Position in the fallback order, 0 being the most preferred.
    #[must_use]
    pub const fn rank(self) -> usize {
        match self {
            Self::Max => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}
