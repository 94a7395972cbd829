//! Operational HTTP endpoints for the host shell: network discovery and
//! remote-generation key management.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::game::prompts::RemoteGenerator;
use crate::network;
use crate::server::GameServer;

/// `GET /api/network`: addresses players can reach this machine on.
pub async fn network_info(State(server): State<Arc<GameServer>>) -> Json<serde_json::Value> {
    Json(json!({
        "addresses": network::list_addresses(),
        "port": server.config().port,
    }))
}

/// `GET /api/config/status`
pub async fn config_status(State(server): State<Arc<GameServer>>) -> Json<serde_json::Value> {
    Json(json!({
        "hasApiKey": server.credentials().has_api_key(),
        "aiAvailable": server.prompts().remote_ready().await,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApiKeyRequest {
    pub api_key: String,
    #[serde(default)]
    pub persist: bool,
}

/// `POST /api/config/apikey`: store a key and enable remote generation.
pub async fn set_api_key(
    State(server): State<Arc<GameServer>>,
    Json(request): Json<SetApiKeyRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match server
        .credentials()
        .set_api_key(&request.api_key, request.persist)
    {
        Ok(()) => {
            server.prompts().set_remote_key(request.api_key.trim()).await;
            (StatusCode::OK, Json(json!({"ok": true})))
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error": err.to_string()})),
        ),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// `POST /api/config/test`: validate a key with a minimal live call.
pub async fn test_api_key(
    State(server): State<Arc<GameServer>>,
    Json(request): Json<TestApiKeyRequest>,
) -> Json<serde_json::Value> {
    let key = request
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| server.credentials().get_api_key());

    let Some(key) = key else {
        return Json(json!({"valid": false, "error": "No API key provided"}));
    };

    match RemoteGenerator::probe(key.trim()).await {
        Ok(()) => Json(json!({"valid": true})),
        Err(err) => Json(json!({"valid": false, "error": err})),
    }
}
