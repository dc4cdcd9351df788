//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! CORS is permissive: any origin, method and header.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Largest accepted intake body (multipart overhead included).
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params would use `:param` syntax (matchit 0.7 / axum 0.7).
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/intake", post(endpoints::intake::submit))
        .route("/intake/", post(endpoints::intake::submit))
        .route("/memory/metadata", get(endpoints::memory::metadata))
        .route("/memory/fields", get(endpoints::memory::fields))
        .route("/memory/conversations", get(endpoints::memory::conversations))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}
