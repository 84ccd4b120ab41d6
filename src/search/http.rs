//! JSON-over-HTTP search client

use super::SearchClient;
use crate::error::{Error, Result};
use crate::types::{Query, RawSearchResult};
use crate::utils::endpoint;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Search client for `GET {base}/search?q=<query>&timeout=<ms>`
///
/// The response body is a JSON array of [`FileDescriptor`](crate::FileDescriptor).
#[derive(Clone, Debug)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    search_url: Url,
}

impl HttpSearchClient {
    /// Create a client for the service rooted at `base_url`
    pub fn new(base_url: Url) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Result<Self> {
        Ok(Self {
            client,
            search_url: endpoint(&base_url, "search")?,
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, query: &Query, timeout: Duration) -> Result<RawSearchResult> {
        let timeout_ms = timeout.as_millis().to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[("q", query.as_str()), ("timeout", timeout_ms.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::debug!(query = %query, timeout_ms = %timeout_ms, "search timed out");
                }
                Error::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!(
                "search service returned {status}: {}",
                body.trim()
            )));
        }

        let hits: RawSearchResult = response.json().await?;
        tracing::debug!(query = %query, hits = hits.len(), "search response received");
        Ok(hits)
    }
}
