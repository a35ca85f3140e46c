//! Application services.

mod chain_builder;
mod fetch_controller;
mod identifier_extractor;
mod url_normalizer;

pub use chain_builder::build_chain;
pub use fetch_controller::{DriveOutcome, FetchController, FetchControllerConfig, decode_thumbnail};
pub use identifier_extractor::extract_identifier;
pub use url_normalizer::normalize;
