//! HTTP endpoint handlers. Quiz play itself happens over the WebSocket.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::instrument;

use crate::difficulty::SESSION_LENGTH;
use crate::domain::KnowledgeLevel;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Data for the setup screen: selectable levels and suggested topics.
#[instrument(level = "info", skip(state))]
pub async fn http_get_setup(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(SetupOut {
    levels: KnowledgeLevel::ALL.to_vec(),
    suggestions: state.config.suggestions.clone(),
    session_length: SESSION_LENGTH,
  })
}
