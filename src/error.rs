use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the search backend. All of them are fatal to the request.
///
/// `api` names the backend endpoint that failed ("search API", "health check API").
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot connect to {api}: {url}")]
    Unreachable { api: &'static str, url: String },
    #[error("{api} request timed out")]
    Timeout { api: &'static str },
    #[error("{api} returned status {status}")]
    Status {
        api: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("{api} returned an unparseable body: {reason}")]
    Decode {
        api: &'static str,
        reason: String,
        body_snippet: String,
    },
    #[error("{api} error: {message}")]
    Transport { api: &'static str, message: String },
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Unreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            UpstreamError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Shape violations found while walking the backend payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("link entry at {location} has no url")]
    MissingUrl { location: String },
    #[error("search API payload has an unexpected shape: {reason}")]
    Malformed { reason: String },
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        FilterError::Malformed {
            reason: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(e) => e.status_code(),
            ApiError::Filter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
