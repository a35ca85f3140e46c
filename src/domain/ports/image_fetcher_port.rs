//! Port definition for the network transport.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::CachePolicy;
use crate::domain::errors::FetchError;

/// Body of a successful image response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Raw payload.
    pub body: Bytes,
    /// Storage policy announced by the server.
    pub cache_policy: CachePolicy,
}

impl FetchedResponse {
    /// Creates a response with no explicit cache directive.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            cache_policy: CachePolicy::Unspecified,
        }
    }
}

/// Port for downloading image bytes. Timeouts belong to the transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    /// Performs a GET for `url`, failing on transport errors and non-success status.
    async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    use parking_lot::Mutex;

    /// Encodes a small solid PNG.
    pub fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode png");
        Bytes::from(buf)
    }

    /// Fetcher that answers from a fixed table and records every request.
    /// URLs without an entry fail with HTTP 404.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Result<FetchedResponse, FetchError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        /// Creates a fetcher where every URL 404s.
        pub fn new() -> Self {
            Self::default()
        }

        /// Serves a valid PNG for `url`.
        pub fn with_image(self, url: &str) -> Self {
            self.with_response(url, Ok(FetchedResponse::new(png_bytes(8, 6))))
        }

        /// Serves an arbitrary outcome for `url`.
        pub fn with_response(self, url: &str, response: Result<FetchedResponse, FetchError>) -> Self {
            self.responses.lock().insert(url.to_string(), response);
            self
        }

        /// Starts serving a valid PNG for `url` on a shared fetcher.
        pub fn set_image(&self, url: &str) {
            self.responses
                .lock()
                .insert(url.to_string(), Ok(FetchedResponse::new(png_bytes(8, 6))));
        }

        /// URLs requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ImageFetcherPort for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError> {
            self.requests.lock().push(url.to_string());
            self.responses
                .lock()
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status { status: 404 }))
        }
    }
}
