//! Document upload and analysis handlers

use axum::extract::{Multipart, State};
use tracing::{debug, error, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, DocumentAnalysisRequest, Json, ResearchResponse};
use crate::domain::SessionId;
use crate::domain::document::DEFAULT_DOCUMENT_TASK;
use crate::infrastructure::document::extract_document;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// POST /api/v1/upload-document
///
/// Multipart form with a `file` field (PDF or DOCX) and an optional `task`.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResearchResponse>, ApiError> {
    let mut file = None;
    let mut task = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read file '{}': {}", file_name, e))
                })?;
                file = Some((file_name, bytes));
            }
            Some("task") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read task: {}", e)))?;
                task = Some(text);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let task = task
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_TASK.to_string());

    debug!(file = %file_name, bytes = bytes.len(), "Document upload");

    let document = tokio::task::spawn_blocking(move || extract_document(&file_name, &bytes))
        .await
        .map_err(|e| {
            error!(error = %e, "Document extraction aborted");
            ApiError::bad_request("Failed to extract text from document")
        })??;

    info!(
        document = %document.name(),
        chars = document.char_count(),
        "Document text extracted"
    );

    let result = state
        .orchestrator
        .upload_document(document, &task)
        .await
        .inspect_err(|e| error!(error = %e, "Document analysis failed"))?;

    Ok(Json(ResearchResponse::from_domain(&result)))
}

/// POST /api/v1/analyze-document
pub async fn analyze_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentAnalysisRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let session_id = SessionId::from(request.session_id.as_str());
    debug!(session_id = %session_id, task = %request.task, "Document analysis request");

    let result = state
        .orchestrator
        .analyze_document(&session_id, &request.task)
        .await
        .inspect_err(|e| error!(session_id = %session_id, error = %e, "Document analysis failed"))?;

    Ok(Json(ResearchResponse::from_domain(&result)))
}
