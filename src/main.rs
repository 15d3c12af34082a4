//! EduAi · Learning Platform Backend
//!
//! - Axum HTTP API: AI roadmap generation, markdown export, AI tutor chat and MCQs
//! - Pluggable completion provider (OpenAI or Gemini, via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 8000)
//!   AI_PROVIDER          : "openai" (default) or "gemini"
//!   OPENAI_API_KEY       : enables the OpenAI provider
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL    : default "gpt-4o-mini"
//!   OPENAI_STRONG_MODEL  : default "gpt-4o"
//!   GEMINI_API_KEY       : enables the Gemini provider
//!   GEMINI_FAST_MODEL    : default "gemini-2.5-flash"
//!   GEMINI_STRONG_MODEL  : default "gemini-2.5-pro"
//!   AI_HTTP_TIMEOUT_SECS : provider HTTP timeout (default 120)
//!   EDUAI_CONFIG_PATH    : path to TOML config (prompts, roadmap settings, catalog)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "json" for structured logs

mod ai;
mod config;
mod domain;
mod error;
mod protocol;
mod roadmap;
mod routes;
mod seeds;
mod state;
mod telemetry;
mod tutor;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: completion provider, prompts, pipeline settings, conversation store.
  let state = Arc::new(AppState::new());

  let app = build_router(state);

  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(DEFAULT_PORT);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "eduai_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "eduai_backend", error = %e, "Failed to listen for shutdown signal");
    return;
  }
  info!(target: "eduai_backend", "Shutdown signal received");
}
