//! Research pipeline error types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

/// The three pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Planning,
    Retrieval,
    Synthesis,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Retrieval => write!(f, "retrieval"),
            Self::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Failure reported by a stage implementation
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{stage} stage failed: {message}")]
pub struct StageFailure {
    pub stage: StageKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    pub fn planning(message: impl Into<String>) -> Self {
        Self::new(StageKind::Planning, message)
    }

    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::new(StageKind::Retrieval, message)
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::new(StageKind::Synthesis, message)
    }

    pub fn timeout(stage: StageKind, timeout: Duration) -> Self {
        Self::new(
            stage,
            format!("model call timed out after {}ms", timeout.as_millis()),
        )
    }

    pub fn from_domain(stage: StageKind, error: DomainError) -> Self {
        Self::new(stage, error.to_string())
    }
}

/// A degradation absorbed by the pipeline and surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageWarning {
    pub stage: StageKind,
    pub message: String,
}

impl StageWarning {
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Errors returned by the orchestrator operations
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("No document found in session: {session_id}")]
    DocumentNotFound { session_id: String },

    #[error("Planning failed: {message}")]
    Planning { message: String },

    #[error("Retrieval failed: {message}")]
    Retrieval { message: String },

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("{stage} stage failed with no fallback: {message}")]
    Stage { stage: StageKind, message: String },

    #[error("Session store error: {0}")]
    Store(#[from] DomainError),
}

impl ResearchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    pub fn document_not_found(session_id: impl fmt::Display) -> Self {
        Self::DocumentNotFound {
            session_id: session_id.to_string(),
        }
    }

    /// Wrap a stage failure that has no defined fallback
    pub fn stage(failure: StageFailure) -> Self {
        Self::Stage {
            stage: failure.stage,
            message: failure.message,
        }
    }

    /// Whether the caller can correct the request and retry
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::SessionNotFound { .. } | Self::DocumentNotFound { .. }
        )
    }
}

impl From<StageFailure> for ResearchError {
    fn from(failure: StageFailure) -> Self {
        match failure.stage {
            StageKind::Planning => Self::Planning {
                message: failure.message,
            },
            StageKind::Retrieval => Self::Retrieval {
                message: failure.message,
            },
            StageKind::Synthesis => Self::Synthesis {
                message: failure.message,
            },
        }
    }
}
