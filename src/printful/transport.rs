//! HTTP transport seam
//!
//! The client talks to the API through the `Transport` trait so the request
//! policy (throttle, retry, caching) can be exercised against a scripted
//! transport in tests. `HttpTransport` is the real implementation on top of
//! reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::printful::error::{ClientError, ClientResult};

/// Status and body of one HTTP exchange, before any interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, token: Option<&str>) -> ClientResult<RawResponse>;

    async fn post(&self, url: &str, token: Option<&str>, body: &Value)
        -> ClientResult<RawResponse>;
}

/// Production transport backed by a pooled reqwest client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("r-pod-fetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        HttpTransport { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        HttpTransport::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, token: Option<&str>) -> ClientResult<RawResponse> {
        debug!(url = %url, "GET");
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: &Value,
    ) -> ClientResult<RawResponse> {
        debug!(url = %url, "POST");
        let mut request = self.client.post(url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
