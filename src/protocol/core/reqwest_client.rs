//! Reqwest-based implementation of the `GameHttpClient` trait.
//!
//! Holds one `reqwest::Client` (and therefore one connection pool) for the
//! lifetime of its owner. Clones share the pool.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use reqwest::Client;
use url::Url;

use super::{DEFAULT_CALL_TIMEOUT, GameHttpClient, GameHttpClientError, GameHttpResponse};

const POOL_MAX_IDLE_PER_HOST: usize = 20;

/// Reqwest-backed HTTP client used for every outbound game call.
#[derive(Clone)]
pub struct ReqwestGameHttpClient {
    client: Client,
}

impl ReqwestGameHttpClient {
    pub fn new() -> Result<Self, GameHttpClientError> {
        Self::with_timeout(DEFAULT_CALL_TIMEOUT)
    }

    /// Builds a pooled client with a hard request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, GameHttpClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .gzip(true)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| GameHttpClientError::Transport(err.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GameHttpClient for ReqwestGameHttpClient {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<GameHttpResponse, GameHttpClientError> {
        let response = self
            .client
            .post(url.as_str())
            .headers(headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|err| GameHttpClientError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| GameHttpClientError::Transport(err.to_string()))?;

        Ok(GameHttpResponse { status, body })
    }
}
