//! Domain error types.

mod fetch_error;
mod transition_error;

pub use fetch_error::FetchError;
pub use transition_error::TransitionError;
