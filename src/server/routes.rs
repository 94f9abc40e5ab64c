use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::AppError;
use crate::protocol::core::ActionResult;
use crate::protocol::regions::supported_regions;

#[derive(Debug, Deserialize)]
pub struct LikeParams {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
}

/// Success body of `GET /like`.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub status: u8,
    #[serde(rename = "LikesGivenByAPI")]
    pub likes_given: i64,
    #[serde(rename = "LikesBeforeCommand")]
    pub likes_before: u64,
    #[serde(rename = "LikesAfterCommand")]
    pub likes_after: u64,
    #[serde(rename = "PlayerNickname")]
    pub nickname: String,
    #[serde(rename = "UID")]
    pub uid: i64,
    #[serde(rename = "SuccessfulRequests")]
    pub successful_requests: usize,
    #[serde(rename = "ResponseTime")]
    pub response_time: String,
    #[serde(rename = "Server")]
    pub server: String,
}

impl From<ActionResult> for LikeResponse {
    fn from(result: ActionResult) -> Self {
        Self {
            status: result.classification.status_code(),
            likes_given: result.delta,
            likes_before: result.before.likes,
            likes_after: result.after.likes,
            response_time: result.response_time(),
            nickname: result.after.nickname,
            uid: result.after.uid,
            successful_requests: result.dispatch.succeeded,
            server: result.region,
        }
    }
}

/// GET /like?uid=&server_name=: run one invocation.
pub async fn like(
    State(app): State<AppState>,
    Query(params): Query<LikeParams>,
) -> Result<Json<LikeResponse>, AppError> {
    let uid = params.uid.filter(|uid| !uid.trim().is_empty());
    let server = params.server_name.filter(|name| !name.trim().is_empty());
    let (Some(uid), Some(server)) = (uid, server) else {
        return Err(AppError::bad_request("UID and server_name are required"));
    };

    let result = app.client.send_likes(&uid, &server).await?;
    Ok(Json(result.into()))
}

/// GET /servers: supported region codes.
pub async fn servers() -> Json<serde_json::Value> {
    let regions = supported_regions();
    Json(serde_json::json!({
        "supported_servers": regions,
        "total_servers": regions.len(),
    }))
}

/// GET /health: liveness plus running totals.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    let now = chrono::Utc::now();
    let mut body = serde_json::json!({
        "status": "healthy",
        "timestamp": now.timestamp_millis() as f64 / 1000.0,
        "uptime_secs": (now - app.started_at).num_seconds(),
    });

    if let Some(metrics) = app.client.metrics() {
        let global = metrics.snapshot().global;
        body["invocations"] = global.invocations.into();
        body["failed_invocations"] = global.failed_invocations.into();
        body["attempts"] = global.total_attempts.into();
        body["successful_attempts"] = global.successes.into();
    }
    Json(body)
}

/// GET /: service description.
pub async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Profile like relay",
        "version": crate::VERSION,
        "endpoints": {
            "/like": "Send likes to player (uid, server_name params)",
            "/servers": "Get supported servers list",
            "/health": "Liveness probe",
        }
    }))
}
