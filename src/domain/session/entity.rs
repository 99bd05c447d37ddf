//! Session entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::research::{
    PriorContext, Query, Report, ResearchPlan, SessionId, SourceSet, StageWarning,
};

/// One committed pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub query: Query,
    pub plan: ResearchPlan,
    pub sources: SourceSet,
    pub report: Report,
    pub warnings: Vec<StageWarning>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        query: Query,
        plan: ResearchPlan,
        sources: SourceSet,
        report: Report,
        warnings: Vec<StageWarning>,
    ) -> Self {
        Self {
            query,
            plan,
            sources,
            report,
            warnings,
            created_at: Utc::now(),
        }
    }
}

/// A session and its ordered turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    id: SessionId,
    turns: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document: Option<Document>,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A new record always holds its first turn
    pub fn new(id: SessionId, first_turn: Turn) -> Self {
        let now = Utc::now();
        Self {
            id,
            turns: vec![first_turn],
            document: None,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Attach the uploaded document the session analyses
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Only session stores append turns
    pub(crate) fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn latest_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_accessed_at < cutoff
    }

    /// Context for a follow-up, taken from the latest turn
    pub fn prior_context(&self) -> Option<PriorContext> {
        self.latest_turn().map(|turn| PriorContext {
            query: turn.query.as_str().to_string(),
            focus_areas: turn.plan.focus_areas().to_vec(),
            key_findings: turn.report.key_findings().to_vec(),
        })
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            turn_count: self.turns.len(),
            document_name: self.document.as_ref().map(|d| d.name().to_string()),
            latest_query: self
                .latest_turn()
                .map(|t| t.query.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Listing view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub turn_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    pub latest_query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(query: &str, finding: &str) -> Turn {
        let query = Query::new(query).unwrap();
        let sources = SourceSet::default();
        let plan = ResearchPlan::new(vec![format!("{} basics", query)], 5);
        let report = Report::new("summary", vec![finding.to_string()], "conclusion", &sources);
        Turn::new(query, plan, sources, report, vec![])
    }

    #[test]
    fn test_new_record_has_one_turn() {
        let record = SessionRecord::new(SessionId::from("s1"), turn("quantum", "qubits"));

        assert_eq!(record.turn_count(), 1);
        assert_eq!(record.id().as_str(), "s1");
        assert_eq!(record.created_at(), record.last_accessed_at());
    }

    #[test]
    fn test_append_and_prior_context() {
        let mut record = SessionRecord::new(SessionId::from("s1"), turn("quantum", "qubits"));
        let before = record.last_accessed_at();

        record.append(turn("error correction", "surface codes"));

        assert_eq!(record.turn_count(), 2);
        assert!(record.last_accessed_at() >= before);

        let prior = record.prior_context().unwrap();
        assert_eq!(prior.query, "error correction");
        assert_eq!(prior.focus_areas, vec!["error correction basics".to_string()]);
        assert_eq!(prior.key_findings, vec!["surface codes".to_string()]);
    }

    #[test]
    fn test_summary() {
        let record = SessionRecord::new(SessionId::from("s1"), turn("quantum", "qubits"));
        let summary = record.summary();

        assert_eq!(summary.turn_count, 1);
        assert_eq!(summary.latest_query, "quantum");
    }

    #[test]
    fn test_idle_check() {
        let record = SessionRecord::new(SessionId::from("s1"), turn("quantum", "qubits"));

        assert!(record.is_idle_since(Utc::now() + chrono::Duration::seconds(1)));
        assert!(!record.is_idle_since(Utc::now() - chrono::Duration::seconds(60)));
    }
}
