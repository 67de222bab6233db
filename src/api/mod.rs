use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::filter::ResultFilter;
use crate::upstream::SearchBackend;
use crate::validator::HttpLinkValidator;

pub mod handlers;

/// Shared by every request. Holds no per-request state.
pub struct AppState {
    pub backend: SearchBackend,
    pub filter: ResultFilter,
}

impl AppState {
    /// One HTTP client, bounded by the configured timeout, is shared by the
    /// backend and the validator.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let validator = HttpLinkValidator::new(client.clone(), config.check_api_url.clone());
        Ok(Self {
            backend: SearchBackend::new(client, config.search_api_url.clone()),
            filter: ResultFilter::new(Arc::new(validator)),
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/search",
            post(handlers::search_post_handler).get(handlers::search_get_handler),
        )
        .route("/api/health", get(handlers::health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
