//! Shared HTTP client used for thumbnail fetches and the Vimeo API

use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client, StatusCode,
};
use std::time::Duration;
use tracing::debug;

/// Status and raw body of a plain GET
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: StatusCode,
    pub bytes: Bytes,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Plain GET returning the body whatever the status
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBody>;
}

/// HTTP client configured from [`MigrationConfig`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: &MigrationConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            MigrationError::ConfigError(format!("Invalid user agent: {}", e))
        })?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .tcp_keepalive(Duration::from_secs(60))
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedBody> {
        debug!("HTTP GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("HTTP GET {} -> {} ({} bytes)", url, status, bytes.len());
        Ok(FetchedBody { status, bytes })
    }
}
