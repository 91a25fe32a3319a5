//! HTTP endpoints next to the WebSocket: user creation and a health probe.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::types::UserId;
use crate::ws;

/// All routes served by the binary
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/users", post(create_user))
        .route("/healthz", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub user_id: UserId,
}

/// Mint a new user id.
///
/// POST /api/users
pub async fn create_user(State(state): State<Arc<AppState>>) -> (StatusCode, Json<CreatedUser>) {
    let user_id = state.create_user().await;
    (StatusCode::CREATED, Json(CreatedUser { user_id }))
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub games: usize,
    pub channels: usize,
}

/// GET /healthz
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let games = state.store.read().await.games.len();
    let channels = state.broadcaster.channel_count().await;
    Json(Health {
        status: "ok",
        games,
        channels,
    })
}
