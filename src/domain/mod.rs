//! Domain layer with core entities, the resolution state machine and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Resolution state machine.
pub mod resolution;

pub use entities::{
    CachePolicy, CandidateChain, CandidateUrl, ImageHost, ImageSource, QualityLevel,
    ResolvedImage, ThumbnailView,
};
pub use errors::{FetchError, TransitionError};
pub use ports::{ImageCachePort, ImageFetcherPort, ResponseCachePort};
pub use resolution::{ExhaustReason, ResolutionAttempt, ResolutionState};
