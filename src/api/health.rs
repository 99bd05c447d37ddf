//! Liveness and readiness endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

impl HealthResponse {
    fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_sessions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::from_checks(Vec::new()))
}

/// GET /ready
pub async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse::from_checks(vec![session_store_check(&state).await]);
    (response.status_code(), Json(response))
}

async fn session_store_check(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let listed = state.orchestrator.list_sessions().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match listed {
        Ok(sessions) => HealthCheck {
            name: "session_store",
            status: HealthStatus::Healthy,
            latency_ms,
            active_sessions: Some(sessions.len()),
            error: None,
        },
        Err(e) => HealthCheck {
            name: "session_store",
            status: HealthStatus::Unhealthy,
            latency_ms,
            active_sessions: None,
            error: Some(e.to_string()),
        },
    }
}
