//! Single-request HTTP retrieval.
//!
//! No retries here. Callers decide whether a failure means an empty
//! result, a skipped chapter, or an aborted crawl.

use crate::config::ScrapingConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use tracing::debug;

/// Retrieves the text of a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Creates the HTTP client shared by all requests of a crawl.
fn create_http_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .cookie_store(true)
        .timeout(config.timeout())
        .build()
}

/// [`Fetcher`] backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapingConfig) -> Result<Self, FetchError> {
        let client = create_http_client(config)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "fetching");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Request(format!("HTTP {status} for {url}")));
        }

        Ok(response.text().await?)
    }
}
