//! Application layer with URL services, the fetch controller and the resolve use case.

/// Services.
pub mod services;
/// Use cases.
pub mod use_cases;

pub use services::{
    FetchController, FetchControllerConfig, build_chain, extract_identifier, normalize,
};
pub use use_cases::{Resolution, ResolutionHandle, Resolve, ThumbnailResolver, ThumbnailSlot};
