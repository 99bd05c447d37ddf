//! Session administration handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, SessionResponse, SessionsListResponse};
use crate::domain::SessionId;

/// GET /api/v1/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsListResponse>, ApiError> {
    let sessions = state.orchestrator.list_sessions().await?;
    Ok(Json(SessionsListResponse::new(sessions)))
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    debug!(session_id = %session_id, "Getting session");

    let record = state
        .orchestrator
        .session(&SessionId::from(session_id))
        .await?;

    Ok(Json(SessionResponse::from_domain(&record)))
}

/// DELETE /api/v1/sessions/{session_id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(session_id = %session_id, "Deleting session");

    state
        .orchestrator
        .delete_session(&SessionId::from(session_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
