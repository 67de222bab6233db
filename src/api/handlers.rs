use axum::body::Bytes;
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;
use std::sync::Arc;

use crate::data_models::SearchQuery;
use crate::error::ApiError;
use crate::filter::RequestOrigin;

use super::AppState;

/// Parse the POST body as JSON whatever the declared content type, and
/// require a `kw` field.
fn parse_search_body(body: &[u8]) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    match value.as_object() {
        Some(obj) if obj.contains_key("kw") => Ok(value),
        _ => Err(ApiError::BadRequest("missing required field: kw".to_string())),
    }
}

pub async fn search_post_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_search_body(&body)?;
    let upstream = state.backend.search_post(&body).await?;
    let filtered = state.filter.filter(upstream, RequestOrigin::Post).await?;
    Ok(Json(filtered))
}

pub async fn search_get_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let upstream = state.backend.search_get(&query).await?;
    let filtered = state.filter.filter(upstream, RequestOrigin::Get).await?;
    Ok(Json(filtered))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.backend.health().await?))
}
