//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - roadmap API under `/api/roadmaps`
/// - AI tutor API under `/api/ai`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/health", get(http::http_health))
        // Roadmaps
        .route("/api/roadmaps", get(http::http_list_roadmaps))
        .route("/api/roadmaps/generate", post(http::http_generate_roadmap))
        .route("/api/roadmaps/markdown", post(http::http_roadmap_markdown))
        // AI tutor
        .route("/api/ai", get(http::http_ai_root))
        .route("/api/ai/", get(http::http_ai_root))
        .route("/api/ai/test", post(http::http_ai_test))
        .route("/api/ai/ask", post(http::http_ai_ask))
        .route("/api/ai/chat", post(http::http_ai_chat))
        .route("/api/ai/conversations", post(http::http_create_conversation))
        .route("/api/ai/conversations/:id", get(http::http_get_conversation))
        .route("/api/ai/mcq", post(http::http_ai_mcq))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
