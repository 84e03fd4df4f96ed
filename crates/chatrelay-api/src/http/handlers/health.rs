//! Liveness endpoint.
//!
//! GET /health - Always 200 while the process is serving.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the store was reachable at startup.
    pub mysql_connected: bool,
    pub active_sessions: usize,
}

/// GET /health - Report store availability and tracked session count.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let service = &state.chat_service;
    Json(HealthResponse {
        status: "ok",
        mysql_connected: service.sink().is_available(),
        active_sessions: service.sessions().active_sessions(),
    })
}
