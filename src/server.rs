//! HTTP surface.
//!
//! - `GET /tweets?t=&a=&j=` - title search with author/journal fallbacks
//! - `GET /search?q=` - single freeform search
//! - `GET /health`

use crate::config::HandlerConfig;
use crate::feed::FeedService;
use crate::response::FeedResponse;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, read-only state. Nothing in here changes between requests.
pub struct AppState {
    pub service: FeedService,
    pub multi_field: HandlerConfig,
    pub freeform: HandlerConfig,
}

impl AppState {
    pub fn new(service: FeedService) -> Self {
        Self {
            service,
            multi_field: HandlerConfig::multi_field(),
            freeform: HandlerConfig::freeform(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/tweets", get(tweets_handler))
        .route("/search", get(search_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn tweets_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> FeedResponse {
    info!(title = ?params.get("t"), "Tweet feed request");
    state.service.respond(&params, &state.multi_field).await
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> FeedResponse {
    info!(query = ?params.get("q"), "Freeform search request");
    state.service.respond(&params, &state.freeform).await
}
