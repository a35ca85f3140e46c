mod image_cache_port;
mod image_fetcher_port;
mod response_cache_port;

pub use image_cache_port::ImageCachePort;
pub use image_fetcher_port::{FetchedResponse, ImageFetcherPort};
pub use response_cache_port::{CacheError, CacheResult, ResponseCachePort};

#[cfg(test)]
pub use image_fetcher_port::MockImageFetcherPort;
