//! Signaling proxy for voice signup sessions.
//!
//! Browsers post their SDP offer here instead of to the realtime provider,
//! so the provider key stays on the server.

pub mod api;
pub mod config;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Request bodies above this size are rejected before reaching a handler.
const MAX_REQUEST_BODY_BYTES: usize = 2 * api::MAX_SDP_BYTES;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    /// Client used for upstream realtime requests.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.realtime.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid cors origin");
                None
            }
        })
        .collect();

    let origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/api/realtime/session", post(api::create_session_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
