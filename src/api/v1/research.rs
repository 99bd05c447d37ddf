//! Research and follow-up handlers

use axum::extract::State;
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::{ApiError, FollowUpRequest, Json, ResearchRequest, ResearchResponse};
use crate::domain::SessionId;

/// POST /api/v1/research
pub async fn create_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    debug!(
        query = %request.query,
        session_id = ?request.session_id,
        num_sources = ?request.num_sources,
        "Research request"
    );

    let result = state
        .orchestrator
        .research_with(&request.query, request.options())
        .await
        .inspect_err(|e| error!(error = %e, "Research failed"))?;

    Ok(Json(ResearchResponse::from_domain(&result)))
}

/// POST /api/v1/follow-up
pub async fn create_follow_up(
    State(state): State<AppState>,
    Json(request): Json<FollowUpRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let session_id = SessionId::from(request.session_id.as_str());
    debug!(session_id = %session_id, query = %request.query, "Follow-up request");

    let result = state
        .orchestrator
        .follow_up(&request.query, &session_id)
        .await
        .inspect_err(|e| error!(session_id = %session_id, error = %e, "Follow-up failed"))?;

    Ok(Json(ResearchResponse::from_domain(&result)))
}
