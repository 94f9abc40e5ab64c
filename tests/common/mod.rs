#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use likeburst::protocol::codec::{AccountInfo, PlayerInfo};
use likeburst::{
    DispatchPolicy, GameHttpClient, GameHttpClientError, GameHttpResponse, LikeClient,
};
use prost::Message;
use tokio::time::Instant;
use url::Url;

/// Scripted stand-in for the game endpoints.
#[derive(Default)]
pub struct FakeGameServer {
    query_bodies: Mutex<VecDeque<Vec<u8>>>,
    pub queries: Mutex<Vec<Bytes>>,
    /// Authorization header and arrival time of each query.
    pub query_log: Mutex<Vec<(String, Instant)>>,
    pub actions: Mutex<Vec<(Bytes, String)>>,
    pub action_times: Mutex<Vec<Instant>>,
    pub reject_tokens: Vec<String>,
}

impl FakeGameServer {
    pub fn with_query_bodies(bodies: Vec<Vec<u8>>) -> Self {
        Self {
            query_bodies: Mutex::new(bodies.into()),
            ..Default::default()
        }
    }

    pub fn rejecting(mut self, tokens: &[&str]) -> Self {
        self.reject_tokens = tokens.iter().map(|t| format!("Bearer {t}")).collect();
        self
    }

    pub fn total_calls(&self) -> usize {
        self.queries.lock().unwrap().len() + self.actions.lock().unwrap().len()
    }
}

#[async_trait]
impl GameHttpClient for FakeGameServer {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<GameHttpResponse, GameHttpClientError> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if url.path().ends_with("/GetPlayerPersonalShow") {
            self.queries.lock().unwrap().push(body);
            self.query_log.lock().unwrap().push((auth, Instant::now()));
            return Ok(match self.query_bodies.lock().unwrap().pop_front() {
                Some(state) => GameHttpResponse::new(200, state),
                None => GameHttpResponse::new(503, Bytes::new()),
            });
        }

        if url.path().ends_with("/LikeProfile") {
            let rejected = self.reject_tokens.contains(&auth);
            self.actions.lock().unwrap().push((body, auth));
            self.action_times.lock().unwrap().push(Instant::now());
            return Ok(GameHttpResponse::new(if rejected { 401 } else { 200 }, Bytes::new()));
        }

        Err(GameHttpClientError::Transport(format!("unexpected url {url}")))
    }
}

pub fn player_state(likes: u32, uid: i64, nickname: &str) -> Vec<u8> {
    PlayerInfo {
        account_info: Some(AccountInfo {
            uid,
            nickname: nickname.into(),
            likes,
            ..Default::default()
        }),
    }
    .encode_to_vec()
}

pub fn write_store(dir: &Path, file: &str, tokens: &[&str]) {
    let records: Vec<_> = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| serde_json::json!({ "uid": 1000 + i, "token": token }))
        .collect();
    std::fs::write(dir.join(file), serde_json::to_string(&records).unwrap()).unwrap();
}

pub fn client_for(dir: &Path, server: Arc<FakeGameServer>) -> LikeClient {
    LikeClient::builder()
        .with_credential_dir(dir)
        .with_http_client(server)
        .with_settle_delay(Duration::ZERO)
        .with_dispatch_policy(DispatchPolicy {
            batch_pause: Duration::ZERO,
            batch_size: 4,
            ..Default::default()
        })
        .build()
        .unwrap()
}
