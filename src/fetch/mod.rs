//! HTTP download of the feed archive.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use tracing::debug;

use crate::error::SummaryError;

/// GETs `url` and returns the response body.
///
/// # Errors
///
/// [`SummaryError::Download`] on an invalid URL, a transport failure or a
/// non-success HTTP status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, SummaryError> {
    let url = url
        .parse()
        .map_err(|e| SummaryError::Download(format!("invalid url {url:?}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| SummaryError::Download(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SummaryError::Download(format!(
            "server returned status {status}"
        )));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| SummaryError::Download(e.to_string()))?;
    debug!(bytes = bytes.len(), "Download complete");

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for CountingClient {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            unreachable!("request should not be sent")
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_download_error() {
        let client = CountingClient::default();

        let err = fetch_bytes(&client, "not a url").await.unwrap_err();

        assert!(matches!(err, SummaryError::Download(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    /// Fails every request in the transport without opening a socket.
    #[derive(Default)]
    struct RefusingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for RefusingClient {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // reqwest rejects non-http schemes before connecting.
            let url = "ftp://feeds.invalid/gtfs.zip".parse().unwrap();
            reqwest::Client::new()
                .execute(reqwest::Request::new(reqwest::Method::GET, url))
                .await
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_download_error() {
        let client = RefusingClient::default();

        let err = fetch_bytes(&client, "https://feeds.invalid/gtfs.zip")
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::Download(_)));
        assert_eq!(err.category(), crate::FailureCategory::SourceUnavailable);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
