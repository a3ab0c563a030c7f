//! Remote fetcher: one timed HTTP GET, no retry
//!
//! Retrying is left to the next coordinator tick. The engine only talks to the
//! network through the [`Fetcher`] trait so it can run against in-memory data.

use crate::config::EndpointsConfig;
use crate::error::{Result, TarifError};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Source of raw response bodies
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body of a 2xx response
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher with a fixed User-Agent and timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client from the endpoint settings
    pub fn new(endpoints: &EndpointsConfig) -> Result<Self> {
        Self::with_settings(
            &endpoints.user_agent,
            Duration::from_secs(endpoints.timeout_seconds),
        )
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TarifError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TarifError::fetch(format!("GET {} returned {}", url, status)));
        }

        let body = resp.bytes().await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_endpoints() {
        let endpoints = EndpointsConfig::default();
        assert!(HttpFetcher::new(&endpoints).is_ok());
    }

    #[tokio::test]
    async fn connection_failure_is_a_fetch_error() {
        let fetcher =
            HttpFetcher::with_settings("tarif-edf-test", Duration::from_millis(500)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let err = fetcher.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_fetch());
    }
}
