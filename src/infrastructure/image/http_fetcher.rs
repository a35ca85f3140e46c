//! HTTP transport for thumbnail downloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use tracing::{debug, trace};

use crate::domain::entities::CachePolicy;
use crate::domain::errors::FetchError;
use crate::domain::ports::{FetchedResponse, ImageFetcherPort};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches image bytes over HTTP(S) with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcherPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        trace!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                url = %url,
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or("Unknown"),
                "Non-success response"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let cache_policy = CachePolicy::from_header(
            response
                .headers()
                .get(CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
        );

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(format!("Failed to read body: {e}")))?;

        trace!(url = %url, size = body.len(), ?cache_policy, "Response received");
        Ok(FetchedResponse { body, cache_policy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the URL to hit.
    async fn serve_once(head: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{head}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/vi/abc/hqdefault.jpg")
    }

    #[tokio::test]
    async fn test_success_carries_cache_policy() {
        let url = serve_once("HTTP/1.1 200 OK\r\nCache-Control: public, max-age=120", b"jpeg").await;
        let fetcher = HttpImageFetcher::new(DEFAULT_TIMEOUT).unwrap();

        let response = fetcher.fetch(&url).await.unwrap();

        assert_eq!(response.body.as_ref(), b"jpeg");
        assert_eq!(
            response.cache_policy,
            CachePolicy::MaxAge(Duration::from_secs(120))
        );
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let url = serve_once("HTTP/1.1 404 Not Found", b"").await;
        let fetcher = HttpImageFetcher::new(DEFAULT_TIMEOUT).unwrap();

        assert_eq!(
            fetcher.fetch(&url).await.unwrap_err(),
            FetchError::Status { status: 404 }
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = HttpImageFetcher::new(Duration::from_secs(2)).unwrap();

        let err = fetcher
            .fetch(&format!("http://{addr}/x.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
