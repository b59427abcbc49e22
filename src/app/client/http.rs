//! HTTP feed fetcher
//!
//! One GET per refresh tick. There is no retry or backoff here: the next
//! tick is the retry, and the cache keeps serving the last good snapshot
//! in the meantime.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::config::ClientConfig;
use super::ScheduleFetcher;
use crate::errors::{FetchError, FetchResult};

/// Fetches the raw schedule payload over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: Url,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Creates a fetcher for `url` with the given client settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the underlying client cannot be built
    pub fn new(url: Url, config: &ClientConfig) -> FetchResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self::with_client(client, url, config.max_body_bytes))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, url: Url, max_body_bytes: usize) -> Self {
        Self {
            client,
            url,
            max_body_bytes,
        }
    }

    /// The upstream endpoint
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn check_size(&self, size: usize) -> FetchResult<()> {
        if size > self.max_body_bytes {
            return Err(FetchError::BodyTooLarge {
                size,
                limit: self.max_body_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleFetcher for HttpFetcher {
    async fn fetch(&self) -> FetchResult<Vec<u8>> {
        let mut response = self.client.get(self.url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            self.check_size(usize::try_from(length).unwrap_or(usize::MAX))?;
        }

        // Content-Length may be absent or wrong, so enforce the limit while reading
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            self.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %self.url, bytes = body.len(), "Fetched schedule feed");
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}/signs", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve(Router::new().route("/signs", get(|| async { "[]" }))).await;
        let fetcher = HttpFetcher::new(url, &ClientConfig::default()).unwrap();

        let body = fetcher.fetch().await.unwrap();
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve(Router::new().route(
            "/signs",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;
        let fetcher = HttpFetcher::new(url, &ClientConfig::default()).unwrap();

        match fetcher.fetch().await {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let url = serve(Router::new().route("/signs", get(|| async { "x".repeat(4096) }))).await;
        let config = ClientConfig::default().with_max_body_bytes(1024);
        let fetcher = HttpFetcher::new(url, &config).unwrap();

        assert!(matches!(
            fetcher.fetch().await,
            Err(FetchError::BodyTooLarge { limit: 1024, .. })
        ));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let url = serve(Router::new().route(
            "/signs",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "[]"
            }),
        ))
        .await;
        let config = ClientConfig::default().with_request_timeout(Duration::from_millis(200));
        let fetcher = HttpFetcher::new(url, &config).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to obtain a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/signs", addr)).unwrap();
        let fetcher = HttpFetcher::new(url, &ClientConfig::default()).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        assert!(!err.is_timeout());
    }
}
