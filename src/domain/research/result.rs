//! Result returned to callers of the orchestrator

use serde::{Deserialize, Serialize};

use super::error::StageWarning;
use super::plan::ResearchPlan;
use super::query::SessionId;
use super::report::Report;
use super::source::{SourceSet, SourceSetProvenance};
use crate::domain::session::Turn;

/// View onto the latest committed turn of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    pub session_id: SessionId,
    pub plan: ResearchPlan,
    pub sources: SourceSet,
    pub report: Report,
    pub warnings: Vec<StageWarning>,
    pub is_follow_up: bool,
    /// Name of the session's uploaded document, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
}

impl ResearchResult {
    pub fn from_turn(session_id: SessionId, turn: &Turn, is_follow_up: bool) -> Self {
        Self {
            query: turn.query.as_str().to_string(),
            session_id,
            plan: turn.plan.clone(),
            sources: turn.sources.clone(),
            report: turn.report.clone(),
            warnings: turn.warnings.clone(),
            is_follow_up,
            document_name: None,
        }
    }

    pub fn with_document_name(mut self, name: Option<String>) -> Self {
        self.document_name = name;
        self
    }

    /// Whether any stage ran in a fallback mode
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn provenance(&self) -> SourceSetProvenance {
        self.sources.provenance()
    }
}
