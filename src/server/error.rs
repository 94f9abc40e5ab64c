use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::client::LikeError;

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Like(LikeError),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Like(err) => StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<LikeError> for AppError {
    fn from(err: LikeError) -> Self {
        AppError::Like(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) => msg,
            AppError::Like(err) => err.to_string(),
        };
        let body = serde_json::json!({ "error": message, "status": status.as_u16() });
        (status, Json(body)).into_response()
    }
}
