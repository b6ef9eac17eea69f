//! Shared HTTP client for source acquisition.
//!
//! One attempt per URL: a failed fetch is a `SourceUnavailable` condition that
//! aborts the whole batch run, so there is no retry or backoff here.

use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tracing::{info_span, Instrument};

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self { client })
    }

    /// GET a URL and return the response body as text. Redirects are followed
    /// by the client; any non-success status maps to [`FetchError::HttpStatus`].
    pub async fn fetch_text(&self, source_id: &str, url: &str) -> Result<String, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        async {
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            let final_url = resp.url().to_string();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    url: final_url,
                });
            }
            Ok(resp.text().await?)
        }
        .instrument(span)
        .await
    }
}
