//! Application use cases.

mod resolve_thumbnail_use_case;

pub use resolve_thumbnail_use_case::{
    Resolution, ResolutionHandle, Resolve, ThumbnailResolver, ThumbnailSlot,
};
