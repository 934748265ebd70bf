use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::FetchConfig;
use crate::html::extract_text_content;
use crate::pipeline::ContentFetcher;
use crate::{Error, Result};

/// HTTP client that downloads a documentation page and reduces it to text.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Self::with_options(config.timeout(), &config.user_agent)
    }

    /// Creates a fetcher with a custom request timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::with_options(timeout, &FetchConfig::default().user_agent)
    }

    fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetches the raw response body of `url`
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let parsed = validate_url(url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;
        let status = response.status();

        if !status.is_success() {
            let reason = if status == StatusCode::NOT_FOUND {
                "page not found (HTTP 404); check the documentation link".to_string()
            } else {
                format!("HTTP {status}")
            };
            return Err(Error::Fetch {
                url: url.to_string(),
                reason,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(url, &e))?;
        info!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let html = self.fetch_html(url).await?;
        let text = extract_text_content(&html);
        debug!(chars = text.len(), "Extracted page text");
        Ok(text)
    }
}

// Note: Default is not implemented as HttpFetcher::new() can fail.

fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("'{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidUrl(format!(
            "'{url}': unsupported scheme '{other}' (expected http or https)"
        ))),
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::Timeout(format!("fetching '{url}' timed out"));
    }
    Error::Fetch {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetcher_creation() {
        let result = HttpFetcher::new(&FetchConfig::default());
        assert!(result.is_ok(), "Fetcher creation should succeed");
    }

    #[tokio::test]
    async fn test_fetch_returns_page_text() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><script>track()</script><body><h1>Timer API</h1><p>POST /timer/</p></body></html>",
            ))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5))?;
        let text = fetcher.fetch(&format!("{}/docs", server.uri())).await?;

        assert_eq!(text, "Timer API POST /timer/");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_fetch_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5))?;
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();

        match err {
            Error::Fetch { reason, .. } => assert!(reason.contains("404")),
            other => panic!("expected fetch error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_server_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5))?;
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();

        assert_eq!(err.category(), "fetch");
        assert!(err.to_string().contains("503"));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_urls() -> anyhow::Result<()> {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5))?;

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));

        let err = fetcher.fetch("ftp://example.com/docs").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_timeout() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(100))?;
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        Ok(())
    }
}
