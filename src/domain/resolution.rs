//! Per-request resolution state machine.
//!
//! ```text
//! Idle -> AttemptingCandidate(i) -> Succeeded
//!                                -> AdvancingCandidate(i) -> AttemptingCandidate(i + 1)
//!                                                         -> Exhausted(ChainExhausted)
//! Idle -> Exhausted(NoResolvableReference)          (empty chain)
//! Exhausted(ChainExhausted) -> AttemptingCandidate(0)  (manual retry, once)
//! ```
//!
//! Transitions are pure; the I/O that decides between them lives in the
//! fetch controller.

use crate::domain::entities::{CandidateChain, CandidateUrl, ResolvedImage, ThumbnailView};
use crate::domain::errors::TransitionError;

/// Why a resolution ended without an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// No identifier or usable URL could be derived; nothing was fetched.
    NoResolvableReference,
    /// Every candidate was attempted and failed.
    ChainExhausted,
}

impl std::fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResolvableReference => write!(f, "no resolvable reference"),
            Self::ChainExhausted => write!(f, "all candidates failed"),
        }
    }
}

/// State of one resolution request.
#[derive(Debug, Clone)]
pub enum ResolutionState {
    /// Created, nothing attempted yet.
    Idle,
    /// Looking up or fetching the candidate at this index.
    AttemptingCandidate(usize),
    /// The candidate at this index failed; about to move on.
    AdvancingCandidate(usize),
    /// Terminal: an image is bound.
    Succeeded(ResolvedImage),
    /// Terminal: no image.
    Exhausted(ExhaustReason),
}

impl ResolutionState {
    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AttemptingCandidate(_) => "attempting",
            Self::AdvancingCandidate(_) => "advancing",
            Self::Succeeded(_) => "succeeded",
            Self::Exhausted(_) => "exhausted",
        }
    }

    /// Returns true for `Succeeded` and `Exhausted`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Exhausted(_))
    }

    /// Maps the state to what a display slot shows.
    #[must_use]
    pub fn view(&self) -> ThumbnailView {
        match self {
            Self::Idle | Self::AttemptingCandidate(_) | Self::AdvancingCandidate(_) => {
                ThumbnailView::Loading
            }
            Self::Succeeded(resolved) => ThumbnailView::Image(resolved.image.clone()),
            Self::Exhausted(_) => ThumbnailView::Failed,
        }
    }
}

/// Transient state for one display request.
#[derive(Debug, Clone)]
pub struct ResolutionAttempt {
    chain: CandidateChain,
    state: ResolutionState,
    retry_available: bool,
    fetch_attempts: usize,
}

impl ResolutionAttempt {
    /// Creates an idle attempt over `chain`.
    #[must_use]
    pub const fn new(chain: CandidateChain) -> Self {
        Self {
            chain,
            state: ResolutionState::Idle,
            retry_available: true,
            fetch_attempts: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Consumes the attempt, returning its final state.
    #[must_use]
    pub fn into_state(self) -> ResolutionState {
        self.state
    }

    /// The chain being walked.
    #[must_use]
    pub const fn chain(&self) -> &CandidateChain {
        &self.chain
    }

    /// Candidates entered so far, including manual retries.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.fetch_attempts
    }

    /// Returns true if a manual retry is still allowed.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.retry_available
            && matches!(
                self.state,
                ResolutionState::Exhausted(ExhaustReason::ChainExhausted)
            )
    }

    /// Candidate targeted by the current attempting/advancing state.
    #[must_use]
    pub fn current(&self) -> Option<&CandidateUrl> {
        match self.state {
            ResolutionState::AttemptingCandidate(i) | ResolutionState::AdvancingCandidate(i) => {
                self.chain.get(i)
            }
            _ => None,
        }
    }

    /// Returns true if the advancing state has another candidate to move to.
    #[must_use]
    pub fn has_next(&self) -> bool {
        match self.state {
            ResolutionState::AdvancingCandidate(i) => i + 1 < self.chain.len(),
            _ => false,
        }
    }

    /// `Idle` to the first candidate, or straight to
    /// `Exhausted(NoResolvableReference)` for an empty chain.
    ///
    /// # Errors
    /// Returns error unless idle.
    pub fn start(&mut self) -> Result<&ResolutionState, TransitionError> {
        if !matches!(self.state, ResolutionState::Idle) {
            return Err(TransitionError::new("start", self.state.name()));
        }
        self.state = if self.chain.is_empty() {
            ResolutionState::Exhausted(ExhaustReason::NoResolvableReference)
        } else {
            self.fetch_attempts += 1;
            ResolutionState::AttemptingCandidate(0)
        };
        Ok(&self.state)
    }

    /// Binds the image for the current candidate.
    ///
    /// # Errors
    /// Returns error unless attempting a candidate.
    pub fn succeed(&mut self, image: ResolvedImage) -> Result<&ResolutionState, TransitionError> {
        if !matches!(self.state, ResolutionState::AttemptingCandidate(_)) {
            return Err(TransitionError::new("succeed", self.state.name()));
        }
        self.state = ResolutionState::Succeeded(image);
        Ok(&self.state)
    }

    /// Marks the current candidate as failed.
    ///
    /// # Errors
    /// Returns error unless attempting a candidate.
    pub fn fail(&mut self) -> Result<&ResolutionState, TransitionError> {
        let ResolutionState::AttemptingCandidate(i) = self.state else {
            return Err(TransitionError::new("fail", self.state.name()));
        };
        self.state = ResolutionState::AdvancingCandidate(i);
        Ok(&self.state)
    }

    /// Moves to the next candidate, or to `Exhausted(ChainExhausted)` after the last.
    ///
    /// # Errors
    /// Returns error unless advancing.
    pub fn advance(&mut self) -> Result<&ResolutionState, TransitionError> {
        let ResolutionState::AdvancingCandidate(i) = self.state else {
            return Err(TransitionError::new("advance", self.state.name()));
        };
        self.state = if i + 1 < self.chain.len() {
            self.fetch_attempts += 1;
            ResolutionState::AttemptingCandidate(i + 1)
        } else {
            ResolutionState::Exhausted(ExhaustReason::ChainExhausted)
        };
        Ok(&self.state)
    }

    /// Manual retry: re-enters at the first candidate. Allowed once, and only
    /// after the chain was actually exhausted.
    ///
    /// # Errors
    /// Returns error if the attempt is not exhausted or the retry was used.
    pub fn retry(&mut self) -> Result<&ResolutionState, TransitionError> {
        if !self.can_retry() {
            let state = if self.state.is_terminal() && !self.retry_available {
                "retry already used"
            } else {
                self.state.name()
            };
            return Err(TransitionError::new("retry", state));
        }
        self.retry_available = false;
        self.fetch_attempts += 1;
        self.state = ResolutionState::AttemptingCandidate(0);
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entities::{CandidateUrl, ImageSource, QualityLevel};

    fn chain_of(n: usize) -> CandidateChain {
        let mut chain = CandidateChain::new();
        for i in 0..n {
            chain.push(CandidateUrl::for_quality(
                format!("https://img.test/{i}.jpg"),
                QualityLevel::High,
            ));
        }
        chain
    }

    fn resolved(url: &str) -> ResolvedImage {
        ResolvedImage::new(
            url,
            Arc::new(image::DynamicImage::new_rgb8(2, 2)),
            ImageSource::Network,
        )
    }

    #[test]
    fn test_empty_chain_exhausts_without_attempt() {
        let mut attempt = ResolutionAttempt::new(CandidateChain::new());
        attempt.start().unwrap();

        assert!(matches!(
            attempt.state(),
            ResolutionState::Exhausted(ExhaustReason::NoResolvableReference)
        ));
        assert_eq!(attempt.attempts(), 0);
        assert!(!attempt.can_retry());
        assert!(attempt.retry().is_err());
    }

    #[test]
    fn test_walks_chain_in_order_then_exhausts() {
        let mut attempt = ResolutionAttempt::new(chain_of(2));
        attempt.start().unwrap();
        assert_eq!(attempt.current().unwrap().url(), "https://img.test/0.jpg");

        attempt.fail().unwrap();
        assert!(attempt.has_next());
        attempt.advance().unwrap();
        assert_eq!(attempt.current().unwrap().url(), "https://img.test/1.jpg");

        attempt.fail().unwrap();
        assert!(!attempt.has_next());
        attempt.advance().unwrap();
        assert!(matches!(
            attempt.state(),
            ResolutionState::Exhausted(ExhaustReason::ChainExhausted)
        ));
        assert_eq!(attempt.attempts(), 2);
        assert!(attempt.state().view().image().is_none());
    }

    #[test]
    fn test_succeed_is_terminal() {
        let mut attempt = ResolutionAttempt::new(chain_of(3));
        attempt.start().unwrap();
        attempt.succeed(resolved("https://img.test/0.jpg")).unwrap();

        assert!(attempt.state().is_terminal());
        assert!(attempt.state().view().image().is_some());
        assert!(attempt.fail().is_err());
        assert!(attempt.advance().is_err());
        assert!(attempt.retry().is_err());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut attempt = ResolutionAttempt::new(chain_of(1));
        assert_eq!(
            attempt.fail().unwrap_err(),
            TransitionError::new("fail", "idle")
        );
        assert!(attempt.advance().is_err());
        assert!(attempt.succeed(resolved("x")).is_err());

        attempt.start().unwrap();
        assert!(attempt.start().is_err());
    }

    #[test]
    fn test_manual_retry_is_single_shot() {
        let mut attempt = ResolutionAttempt::new(chain_of(1));
        attempt.start().unwrap();
        attempt.fail().unwrap();
        attempt.advance().unwrap();
        assert!(attempt.can_retry());

        attempt.retry().unwrap();
        assert!(matches!(
            attempt.state(),
            ResolutionState::AttemptingCandidate(0)
        ));

        attempt.fail().unwrap();
        attempt.advance().unwrap();
        assert!(!attempt.can_retry());
        let err = attempt.retry().unwrap_err();
        assert_eq!(err.state, "retry already used");
    }

    #[test]
    fn test_in_flight_states_show_loading() {
        let mut attempt = ResolutionAttempt::new(chain_of(2));
        assert!(attempt.state().view().is_loading());
        attempt.start().unwrap();
        assert!(attempt.state().view().is_loading());
        attempt.fail().unwrap();
        assert!(attempt.state().view().is_loading());
    }
}
