//! Versioned research API

pub mod documents;
pub mod research;
pub mod sessions;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::state::AppState;

/// Routes mounted under `/api/v1`
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/research", post(research::create_research))
        .route("/follow-up", post(research::create_follow_up))
        .route(
            "/upload-document",
            post(documents::upload_document)
                .layer(DefaultBodyLimit::max(documents::MAX_UPLOAD_BYTES)),
        )
        .route("/analyze-document", post(documents::analyze_document))
        .route("/sessions", get(sessions::list_sessions))
        .route(
            "/sessions/{session_id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
}
