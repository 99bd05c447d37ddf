//! Request and response bodies for the research endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::document::DEFAULT_DOCUMENT_TASK;
use crate::domain::research::{ResearchOptions, SourceSetProvenance};
use crate::domain::{
    Provenance, ResearchResult, SessionId, SessionRecord, SessionSummary, Source, StageWarning,
    Turn,
};

/// POST /api/v1/research
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    /// Continue in an existing session
    #[serde(default)]
    pub session_id: Option<String>,
    /// Requested source count, clamped to the configured bounds
    #[serde(default)]
    pub num_sources: Option<usize>,
}

impl ResearchRequest {
    pub fn options(&self) -> ResearchOptions {
        let mut options = ResearchOptions::default();
        if let Some(id) = &self.session_id {
            options = options.in_session(SessionId::from(id.as_str()));
        }
        if let Some(count) = self.num_sources {
            options = options.with_num_sources(count);
        }
        options
    }
}

/// POST /api/v1/follow-up
#[derive(Debug, Clone, Deserialize)]
pub struct FollowUpRequest {
    pub query: String,
    pub session_id: String,
}

/// POST /api/v1/analyze-document
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentAnalysisRequest {
    pub session_id: String,
    #[serde(default = "default_document_task")]
    pub task: String,
}

fn default_document_task() -> String {
    DEFAULT_DOCUMENT_TASK.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Publishing domain
    pub source: String,
    pub credibility: f32,
    pub provenance: Provenance,
    pub retrieved_at: DateTime<Utc>,
}

impl SourceInfo {
    pub fn from_domain(source: &Source) -> Self {
        Self {
            title: source.title().to_string(),
            url: source.url().to_string(),
            snippet: source.snippet().to_string(),
            source: source.domain().to_string(),
            credibility: source.credibility(),
            provenance: source.provenance(),
            retrieved_at: source.retrieved_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInfo {
    pub strategy: String,
    pub focus_areas: Vec<String>,
    pub target_source_count: usize,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub success: bool,
    pub session_id: String,
    pub query: String,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub conclusion: String,
    pub citations: Vec<String>,
    pub sources: Vec<SourceInfo>,
    pub num_sources: usize,
    pub provenance: SourceSetProvenance,
    pub plan: PlanInfo,
    pub is_follow_up: bool,
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<StageWarning>,
}

impl ResearchResponse {
    pub fn from_domain(result: &ResearchResult) -> Self {
        let report = &result.report;

        Self {
            success: true,
            session_id: result.session_id.to_string(),
            query: result.query.clone(),
            summary: report.summary().to_string(),
            key_findings: report.key_findings().to_vec(),
            conclusion: report.conclusion().to_string(),
            citations: report.citations().to_vec(),
            sources: result.sources.iter().map(SourceInfo::from_domain).collect(),
            num_sources: result.sources.len(),
            provenance: result.provenance(),
            plan: PlanInfo {
                strategy: result.plan.strategy().to_string(),
                focus_areas: result.plan.focus_areas().to_vec(),
                target_source_count: result.plan.target_source_count(),
                is_fallback: result.plan.is_fallback(),
            },
            is_follow_up: result.is_follow_up,
            degraded: result.is_degraded(),
            document_name: result.document_name.clone(),
            warnings: result.warnings.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInfo {
    pub query: String,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub num_sources: usize,
    pub created_at: DateTime<Utc>,
}

impl TurnInfo {
    fn from_domain(turn: &Turn) -> Self {
        Self {
            query: turn.query.as_str().to_string(),
            summary: turn.report.summary().to_string(),
            key_findings: turn.report.key_findings().to_vec(),
            num_sources: turn.sources.len(),
            created_at: turn.created_at,
        }
    }
}

/// GET /api/v1/sessions/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    pub turns: Vec<TurnInfo>,
}

impl SessionResponse {
    pub fn from_domain(record: &SessionRecord) -> Self {
        Self {
            session_id: record.id().to_string(),
            created_at: record.created_at(),
            last_accessed_at: record.last_accessed_at(),
            document_name: record.document().map(|d| d.name().to_string()),
            turns: record.turns().iter().map(TurnInfo::from_domain).collect(),
        }
    }
}

/// GET /api/v1/sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

impl SessionsListResponse {
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        Self {
            total: sessions.len(),
            sessions,
        }
    }
}
