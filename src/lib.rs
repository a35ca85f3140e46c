//! Thumbline - thumbnail resolution and caching for video catalog clients.
//!
//! Turns loosely formed media references (bare ids, share links, playback
//! links, direct image URLs) into fetchable image URLs, walks a fallback
//! chain of quality and host variants, and keeps results in a memory tier
//! backed by a persistent response cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing URL services and the resolve use case.
pub mod application;
/// Domain layer containing entities, errors, ports and the resolution state machine.
pub mod domain;
/// Infrastructure layer containing caches, HTTP transport and configuration.
pub mod infrastructure;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "thumbline";
