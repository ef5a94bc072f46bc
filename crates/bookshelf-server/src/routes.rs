// ABOUTME: Route definitions for the bookshelf HTTP API.
// ABOUTME: Assembles story, upload, static image, and health routes into one Axum Router.

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the complete Axum router. When `uploads_dir` is given, stored cover
/// images are served from it under `/uploads`.
pub fn create_router(state: SharedState, uploads_dir: Option<PathBuf>) -> Router {
    let upload_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/stories",
            get(api::stories::list_stories)
                .post(api::stories::create_story)
                .head(api::stories::reject_method)
                .fallback(api::stories::reject_method),
        )
        .route(
            "/api/uploads",
            post(api::uploads::upload_image)
                .fallback(api::uploads::reject_method)
                .layer(DefaultBodyLimit::max(upload_limit)),
        );

    if let Some(dir) = uploads_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
