use std::path::Path;
use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::server::GameServer;

use super::api;
use super::handler::websocket_handler;

/// Create the Axum router: WebSocket game protocol, the static host and
/// player UIs, and the ops API.
pub fn create_router(config: &Config) -> Router<Arc<GameServer>> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = if config.cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let static_root = Path::new(&config.static_dir);

    Router::new()
        .route("/", get(|| async { Redirect::to("/host") }))
        .nest_service("/host", ServeDir::new(static_root.join("host")))
        .nest_service("/play", ServeDir::new(static_root.join("play")))
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/api/network", get(api::network_info))
        .route("/api/config/status", get(api::config_status))
        .route("/api/config/apikey", post(api::set_api_key))
        .route("/api/config/test", post(api::test_api_key))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
