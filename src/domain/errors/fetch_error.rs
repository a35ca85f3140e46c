//! Errors for a single candidate fetch.

use thiserror::Error;

/// Failure to turn one candidate URL into a decoded image.
///
/// Every variant is recovered locally by advancing to the next candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("empty response body")]
    EmptyBody,

    #[error("failed to decode image: {message}")]
    Decode { message: String },
}

impl FetchError {
    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the payload arrived but was not an image.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::EmptyBody)
    }
}
