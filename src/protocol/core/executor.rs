//! Single-call transport.
//!
//! Wraps one authenticated POST of an encrypted record. Every failure mode
//! (connection error, timeout, non-200 status, bad header) is caught here and
//! reported as a negative or empty outcome; nothing propagates to callers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::credentials::Credential;
use crate::protocol::regions::{ClientProfile, RegionError};

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Contract that abstracts the underlying HTTP stack.
///
/// Implementations are long-lived and shared across concurrent attempts, so
/// they should pool connections internally.
#[async_trait]
pub trait GameHttpClient: Send + Sync {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<GameHttpResponse, GameHttpClientError>;
}

/// Minimal response representation returned by the client abstraction.
#[derive(Debug, Clone)]
pub struct GameHttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl GameHttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Error)]
pub enum GameHttpClientError {
    #[error("http transport error: {0}")]
    Transport(String),
}

/// Reasons a single call produced no usable outcome.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request headers rejected: {0}")]
    Header(#[from] RegionError),
    #[error(transparent)]
    Client(#[from] GameHttpClientError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Executes authenticated calls against the game endpoints.
#[derive(Clone)]
pub struct Transport {
    client: Arc<dyn GameHttpClient>,
    profile: ClientProfile,
    timeout: Duration,
}

impl Transport {
    pub fn new(client: Arc<dyn GameHttpClient>) -> Self {
        Self {
            client,
            profile: ClientProfile::mobile(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_profile(mut self, profile: ClientProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Action call: `true` only on HTTP 200.
    pub async fn send_action(&self, payload: Bytes, credential: &Credential, url: &Url) -> bool {
        match self.exchange(payload, credential, url).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!("action request for {} failed: {err}", credential.uid);
                false
            }
        }
    }

    /// Query call: raw body on HTTP 200, `None` otherwise.
    pub async fn send_query(
        &self,
        payload: Bytes,
        credential: &Credential,
        url: &Url,
    ) -> Option<Bytes> {
        match self.exchange(payload, credential, url).await {
            Ok(response) => Some(response.body),
            Err(err) => {
                log::warn!("query request to {url} failed: {err}");
                None
            }
        }
    }

    async fn exchange(
        &self,
        payload: Bytes,
        credential: &Credential,
        url: &Url,
    ) -> Result<GameHttpResponse, TransportError> {
        let headers = self.profile.authorized(&credential.token)?;
        let response = tokio::time::timeout(self.timeout, self.client.post(url, &headers, payload))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;

        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubClient {
        responses: Mutex<Vec<Result<GameHttpResponse, GameHttpClientError>>>,
        seen: Mutex<Vec<HeaderMap>>,
    }

    impl StubClient {
        fn new(responses: Vec<Result<GameHttpResponse, GameHttpClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GameHttpClient for StubClient {
        async fn post(
            &self,
            _url: &Url,
            headers: &HeaderMap,
            _body: Bytes,
        ) -> Result<GameHttpResponse, GameHttpClientError> {
            self.seen.lock().unwrap().push(headers.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("no more stub responses")
        }
    }

    struct SlowClient;

    #[async_trait]
    impl GameHttpClient for SlowClient {
        async fn post(
            &self,
            _url: &Url,
            _headers: &HeaderMap,
            _body: Bytes,
        ) -> Result<GameHttpResponse, GameHttpClientError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(GameHttpResponse::new(200, Bytes::new()))
        }
    }

    fn url() -> Url {
        Url::parse("https://game.example/LikeProfile").unwrap()
    }

    #[tokio::test]
    async fn action_succeeds_only_on_200() {
        let client = Arc::new(StubClient::new(vec![
            Ok(GameHttpResponse::new(200, Bytes::new())),
            Ok(GameHttpResponse::new(401, Bytes::new())),
            Err(GameHttpClientError::Transport("reset".into())),
        ]));
        let transport = Transport::new(client.clone());
        let credential = Credential::new("1", "tok");

        assert!(transport.send_action(Bytes::from_static(b"x"), &credential, &url()).await);
        assert!(!transport.send_action(Bytes::from_static(b"x"), &credential, &url()).await);
        assert!(!transport.send_action(Bytes::from_static(b"x"), &credential, &url()).await);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].get("authorization").unwrap(), "Bearer tok");
    }

    #[tokio::test]
    async fn query_returns_body_or_none() {
        let client = Arc::new(StubClient::new(vec![
            Ok(GameHttpResponse::new(200, Bytes::from_static(b"\x0a\x00"))),
            Ok(GameHttpResponse::new(500, Bytes::from_static(b"oops"))),
        ]));
        let transport = Transport::new(client);
        let credential = Credential::new("1", "tok");

        let body = transport
            .send_query(Bytes::new(), &credential, &url())
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"\x0a\x00");
        assert!(transport.send_query(Bytes::new(), &credential, &url()).await.is_none());
    }

    #[tokio::test]
    async fn slow_call_times_out_as_failure() {
        let transport = Transport::new(Arc::new(SlowClient)).with_timeout(Duration::from_millis(20));
        let credential = Credential::new("1", "tok");
        assert!(!transport.send_action(Bytes::new(), &credential, &url()).await);
    }

    #[tokio::test]
    async fn invalid_token_never_reaches_the_client() {
        let client = Arc::new(StubClient::new(vec![]));
        let transport = Transport::new(client.clone());
        let credential = Credential::new("1", "line\nbreak");
        assert!(!transport.send_action(Bytes::new(), &credential, &url()).await);
        assert!(client.seen.lock().unwrap().is_empty());
    }
}
