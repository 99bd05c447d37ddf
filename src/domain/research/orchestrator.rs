//! Research orchestrator
//!
//! Runs the planning, retrieval and synthesis stages in sequence and commits
//! the outcome to the session store as a single turn. Nothing is written
//! unless every stage succeeded or degraded to its fallback.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{ResearchError, StageFailure, StageKind, StageWarning};
use super::plan::{PriorContext, ResearchPlan, SourceBounds};
use super::query::{Query, SessionId};
use super::report::Report;
use super::result::ResearchResult;
use super::source::{Source, SourceSet};
use super::stage::{
    PlanningInput, ReportSynthesizer, ResearchPlanner, RetrievalInput, SourceRetriever,
    SynthesisInput,
};
use crate::domain::DomainError;
use crate::domain::document::Document;
use crate::domain::session::{SessionRecord, SessionStore, SessionSummary, Turn};

/// Fallback and bounds policy for the pipeline
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub bounds: SourceBounds,
    /// Use the default plan when planning fails
    pub planning_fallback: bool,
    /// Use an extractive report when synthesis fails
    pub synthesis_fallback: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bounds: SourceBounds::default(),
            planning_fallback: true,
            synthesis_fallback: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_bounds(mut self, bounds: SourceBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_planning_fallback(mut self, enabled: bool) -> Self {
        self.planning_fallback = enabled;
        self
    }

    pub fn with_synthesis_fallback(mut self, enabled: bool) -> Self {
        self.synthesis_fallback = enabled;
        self
    }
}

/// Per-request options for `research_with`
#[derive(Debug, Clone, Default)]
pub struct ResearchOptions {
    /// Continue in this existing session instead of creating one
    pub session_id: Option<SessionId>,
    /// Requested source count, clamped to the configured bounds
    pub num_sources: Option<usize>,
}

impl ResearchOptions {
    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_num_sources(mut self, count: usize) -> Self {
        self.num_sources = Some(count);
        self
    }
}

/// Supplementary web sources searched when analysing a stored document
pub const SUPPLEMENTARY_SOURCES: usize = 3;

const DOCUMENT_STRATEGY: &str = "analysis of the uploaded document";

/// Entry point for research and follow-up requests
pub struct ResearchOrchestrator {
    planner: Arc<dyn ResearchPlanner>,
    retriever: Arc<dyn SourceRetriever>,
    synthesizer: Arc<dyn ReportSynthesizer>,
    store: Arc<dyn SessionStore>,
    config: OrchestratorConfig,
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for ResearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchOrchestrator")
            .field("planner", &self.planner)
            .field("retriever", &self.retriever)
            .field("synthesizer", &self.synthesizer)
            .field("config", &self.config)
            .finish()
    }
}

impl ResearchOrchestrator {
    pub fn new(
        planner: Arc<dyn ResearchPlanner>,
        retriever: Arc<dyn SourceRetriever>,
        synthesizer: Arc<dyn ReportSynthesizer>,
        store: Arc<dyn SessionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            planner,
            retriever,
            synthesizer,
            store,
            config,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Research a new question in a fresh session
    pub async fn research(&self, query: &str) -> Result<ResearchResult, ResearchError> {
        self.research_with(query, ResearchOptions::default()).await
    }

    /// Research a question, optionally inside an existing session.
    ///
    /// A supplied session gains one turn that starts without prior context;
    /// an unknown session id fails with `SessionNotFound`.
    pub async fn research_with(
        &self,
        query: &str,
        options: ResearchOptions,
    ) -> Result<ResearchResult, ResearchError> {
        let query = Query::new(query)?;
        let target = options.num_sources.map(|n| self.config.bounds.clamp(n));

        if let Some(session_id) = options.session_id {
            return self
                .locked(&session_id, self.extend_session(&session_id, query, target, false))
                .await;
        }

        let session_id = SessionId::generate();

        info!(session_id = %session_id, query = %query, "Starting research");

        let turn = self.run_pipeline(&session_id, &query, None, target).await?;
        let record = self
            .store
            .create(SessionRecord::new(session_id.clone(), turn))
            .await?;

        info!(session_id = %session_id, "Session created");

        latest_result(&record, false)
    }

    /// Continue an existing session with a new question
    pub async fn follow_up(
        &self,
        query: &str,
        session_id: &SessionId,
    ) -> Result<ResearchResult, ResearchError> {
        let query = Query::new(query)?;

        self.locked(session_id, self.extend_session(session_id, query, None, true)).await
    }

    /// Analyse an uploaded document in a new session that keeps the document
    pub async fn upload_document(
        &self,
        document: Document,
        task: &str,
    ) -> Result<ResearchResult, ResearchError> {
        let task = Query::new(task)?;
        let session_id = SessionId::generate();

        info!(
            session_id = %session_id,
            document = %document.name(),
            chars = document.char_count(),
            "Analyzing uploaded document"
        );

        let mut warnings = Vec::new();
        let sources = SourceSet::from_candidates(vec![Source::from_document(&document)], 1);
        let plan = ResearchPlan::new(vec![task.as_str().to_string()], 1)
            .with_strategy(DOCUMENT_STRATEGY);

        let report = self
            .synthesize(
                &session_id,
                &task,
                &sources,
                vec![document_context(&document)],
                &mut warnings,
            )
            .await?;

        let turn = Turn::new(task, plan, sources, report, warnings);
        let record = self
            .store
            .create(SessionRecord::new(session_id.clone(), turn).with_document(document))
            .await?;

        info!(session_id = %session_id, "Document session created");

        latest_result(&record, false)
    }

    /// Analyse the session's stored document again with a new task, adding
    /// a few supplementary web sources
    pub async fn analyze_document(
        &self,
        session_id: &SessionId,
        task: &str,
    ) -> Result<ResearchResult, ResearchError> {
        let task = Query::new(task)?;

        self.locked(session_id, self.analyze_stored_document(session_id, task)).await
    }

    /// Look up a session record
    pub async fn session(&self, session_id: &SessionId) -> Result<SessionRecord, ResearchError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| ResearchError::session_not_found(session_id))
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ResearchError> {
        Ok(self.store.list().await?)
    }

    /// Delete a session; unknown ids fail with `SessionNotFound`
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), ResearchError> {
        let deleted = self
            .locked(session_id, async { Ok(self.store.delete(session_id).await?) })
            .await?;

        if deleted {
            info!(session_id = %session_id, "Session deleted");
            Ok(())
        } else {
            Err(ResearchError::session_not_found(session_id))
        }
    }

    /// Remove sessions idle for longer than `max_idle`.
    ///
    /// Sessions with a run holding their lock are kept. The lock map stays
    /// locked for the whole sweep so no run can start on a session while it
    /// is being removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> Result<Vec<SessionId>, ResearchError> {
        let max_idle = chrono::Duration::from_std(max_idle)
            .map_err(|_| ResearchError::validation("Idle duration out of range"))?;

        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return Ok(Vec::new());
        };

        let mut locks = self.session_locks.lock().await;
        let busy: HashSet<SessionId> = locks
            .iter()
            .filter(|(_, lock)| Arc::strong_count(lock) > 1)
            .map(|(id, _)| id.clone())
            .collect();

        let evicted = self.store.evict_idle(cutoff, &busy).await?;

        for id in &evicted {
            locks.remove(id);
        }
        drop(locks);

        if !busy.is_empty() {
            debug!(count = busy.len(), "Kept idle sessions with runs in flight");
        }
        if !evicted.is_empty() {
            info!(count = evicted.len(), "Evicted idle sessions");
        }

        Ok(evicted)
    }

    /// Run `work` while holding the session's lock
    async fn locked<T>(
        &self,
        session_id: &SessionId,
        work: impl Future<Output = Result<T, ResearchError>>,
    ) -> Result<T, ResearchError> {
        let result = {
            let lock = self.session_lock(session_id).await;
            let _guard = lock.lock().await;
            work.await
        };
        self.release_lock(session_id).await;

        result
    }

    async fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_lock(&self, session_id: &SessionId) {
        let mut locks = self.session_locks.lock().await;
        // Keep the entry while another caller is waiting on it
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }

    /// Append one pipeline run to an existing session. Caller holds the lock.
    async fn extend_session(
        &self,
        session_id: &SessionId,
        query: Query,
        target: Option<usize>,
        is_follow_up: bool,
    ) -> Result<ResearchResult, ResearchError> {
        let record = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| ResearchError::session_not_found(session_id))?;

        info!(
            session_id = %session_id,
            query = %query,
            turns = record.turn_count(),
            is_follow_up,
            "Continuing session"
        );

        let prior = if is_follow_up {
            record.prior_context()
        } else {
            None
        };
        let turn = self.run_pipeline(session_id, &query, prior, target).await?;

        self.commit_turn(session_id, turn, is_follow_up).await
    }

    /// Caller holds the lock
    async fn analyze_stored_document(
        &self,
        session_id: &SessionId,
        task: Query,
    ) -> Result<ResearchResult, ResearchError> {
        let record = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| ResearchError::session_not_found(session_id))?;
        let document = record
            .document()
            .ok_or_else(|| ResearchError::document_not_found(session_id))?;

        info!(
            session_id = %session_id,
            document = %document.name(),
            task = %task,
            "Analyzing stored document"
        );

        let mut warnings = Vec::new();
        let plan = self
            .plan(session_id, &task, None, &mut warnings)
            .await?
            .with_target(SUPPLEMENTARY_SOURCES);

        let input = RetrievalInput {
            query: task.clone(),
            plan: plan.clone(),
        };
        let supplementary = match self.retriever.retrieve(&input).await {
            Ok(output) => {
                warnings.extend(output.warnings);
                output.sources.as_slice().to_vec()
            }
            Err(failure) => {
                warn!(
                    session_id = %session_id,
                    error = %failure,
                    "Supplementary retrieval failed, analyzing the document alone"
                );
                warnings.push(StageWarning::new(
                    StageKind::Retrieval,
                    format!("{}; analysis uses the document only", failure.message),
                ));
                Vec::new()
            }
        };

        let mut candidates = vec![Source::from_document(document)];
        candidates.extend(supplementary);
        let sources = SourceSet::from_candidates(candidates, SUPPLEMENTARY_SOURCES + 1);

        let mut context = vec![document_context(document)];
        if let Some(prior) = record.prior_context() {
            context.extend(prior.key_findings);
        }

        let report = self
            .synthesize(session_id, &task, &sources, context, &mut warnings)
            .await?;
        let turn = Turn::new(task, plan, sources, report, warnings);

        self.commit_turn(session_id, turn, true).await
    }

    async fn commit_turn(
        &self,
        session_id: &SessionId,
        turn: Turn,
        is_follow_up: bool,
    ) -> Result<ResearchResult, ResearchError> {
        let record = self
            .store
            .append_turn(session_id, turn)
            .await
            .map_err(|e| match e {
                DomainError::NotFound { .. } => ResearchError::session_not_found(session_id),
                other => ResearchError::Store(other),
            })?;

        info!(session_id = %session_id, turns = record.turn_count(), "Turn appended");

        latest_result(&record, is_follow_up)
    }

    async fn run_pipeline(
        &self,
        session_id: &SessionId,
        query: &Query,
        prior: Option<PriorContext>,
        target: Option<usize>,
    ) -> Result<Turn, ResearchError> {
        let mut warnings = Vec::new();
        let prior_findings = prior
            .as_ref()
            .map(|p| p.key_findings.clone())
            .unwrap_or_default();

        let mut plan = self.plan(session_id, query, prior, &mut warnings).await?;
        if let Some(count) = target {
            plan = plan.with_target(count);
        }

        info!(
            session_id = %session_id,
            stage = %StageKind::Retrieval,
            focus_areas = plan.focus_areas().len(),
            target = plan.target_source_count(),
            "Retrieving sources"
        );

        let retrieval = self
            .retriever
            .retrieve(&RetrievalInput {
                query: query.clone(),
                plan: plan.clone(),
            })
            .await
            .map_err(|failure| {
                warn!(session_id = %session_id, error = %failure, "Retrieval failed");
                ResearchError::from(failure)
            })?;

        for warning in &retrieval.warnings {
            warn!(session_id = %session_id, stage = %warning.stage, "{}", warning.message);
        }
        warnings.extend(retrieval.warnings);

        let mut sources = retrieval.sources;
        if sources.is_empty() {
            return Err(StageFailure::retrieval("no sources could be retrieved").into());
        }
        if sources.len() > plan.target_source_count() {
            sources = SourceSet::from_candidates(
                sources.as_slice().to_vec(),
                plan.target_source_count(),
            );
        }

        let report = self
            .synthesize(session_id, query, &sources, prior_findings, &mut warnings)
            .await?;

        debug!(
            session_id = %session_id,
            sources = sources.len(),
            warnings = warnings.len(),
            "Pipeline complete"
        );

        Ok(Turn::new(query.clone(), plan, sources, report, warnings))
    }

    async fn plan(
        &self,
        session_id: &SessionId,
        query: &Query,
        prior: Option<PriorContext>,
        warnings: &mut Vec<StageWarning>,
    ) -> Result<ResearchPlan, ResearchError> {
        info!(session_id = %session_id, stage = %StageKind::Planning, "Planning research");

        let input = PlanningInput {
            query: query.clone(),
            prior,
            bounds: self.config.bounds,
        };

        let failure = match self.planner.plan(&input).await {
            Ok(plan) if !plan.focus_areas().is_empty() => {
                return Ok(plan.clamp_target(self.config.bounds));
            }
            Ok(_) => StageFailure::planning("plan has no focus areas"),
            Err(failure) => failure,
        };

        if !self.config.planning_fallback {
            warn!(session_id = %session_id, error = %failure, "Planning failed");
            return Err(ResearchError::stage(failure));
        }

        warn!(session_id = %session_id, error = %failure, "Planning failed, using default plan");
        warnings.push(StageWarning::new(
            StageKind::Planning,
            format!("{}; used the default plan", failure.message),
        ));

        Ok(ResearchPlan::fallback(query).clamp_target(self.config.bounds))
    }

    async fn synthesize(
        &self,
        session_id: &SessionId,
        query: &Query,
        sources: &SourceSet,
        prior_findings: Vec<String>,
        warnings: &mut Vec<StageWarning>,
    ) -> Result<Report, ResearchError> {
        info!(
            session_id = %session_id,
            stage = %StageKind::Synthesis,
            sources = sources.len(),
            "Synthesizing report"
        );

        let input = SynthesisInput {
            query: query.clone(),
            sources: sources.clone(),
            prior_findings,
        };

        let failure = match self.synthesizer.synthesize(&input).await {
            Ok(report) if report.citations().len() == sources.len() => return Ok(report),
            Ok(report) => StageFailure::synthesis(format!(
                "report cites {} sources but {} were retrieved",
                report.citations().len(),
                sources.len()
            )),
            Err(failure) => failure,
        };

        if !self.config.synthesis_fallback {
            warn!(session_id = %session_id, error = %failure, "Synthesis failed");
            return Err(ResearchError::stage(failure));
        }

        warn!(
            session_id = %session_id,
            error = %failure,
            "Synthesis failed, using extractive report"
        );
        warnings.push(StageWarning::new(
            StageKind::Synthesis,
            format!("{}; report lists source snippets only", failure.message),
        ));

        Ok(Report::extractive(sources))
    }
}

fn latest_result(
    record: &SessionRecord,
    is_follow_up: bool,
) -> Result<ResearchResult, ResearchError> {
    let turn = record
        .latest_turn()
        .ok_or_else(|| DomainError::internal("session record has no turns"))?;

    Ok(
        ResearchResult::from_turn(record.id().clone(), turn, is_follow_up)
            .with_document_name(record.document().map(|d| d.name().to_string())),
    )
}

fn document_context(document: &Document) -> String {
    format!("Document: {}", document.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credibility::CredibilityConfig;
    use crate::domain::research::stage::mock::{MockPlanner, MockRetriever, MockSynthesizer};
    use crate::domain::research::Provenance;
    use crate::domain::session::MockSessionStore;
    use crate::infrastructure::research::{RetrieverConfig, SearchSourceRetriever};
    use crate::infrastructure::search::SyntheticSearchProvider;
    use crate::infrastructure::session::InMemorySessionStore;

    fn plan(count: usize) -> ResearchPlan {
        ResearchPlan::new(vec!["history".to_string(), "applications".to_string()], count)
            .with_strategy("broad survey")
    }

    fn orchestrator(
        planner: MockPlanner,
        retriever: MockRetriever,
        synthesizer: Arc<MockSynthesizer>,
        store: Arc<InMemorySessionStore>,
        config: OrchestratorConfig,
    ) -> ResearchOrchestrator {
        ResearchOrchestrator::new(
            Arc::new(planner),
            Arc::new(retriever),
            synthesizer,
            store,
            config,
        )
    }

    fn default_orchestrator(store: Arc<InMemorySessionStore>) -> ResearchOrchestrator {
        orchestrator(
            MockPlanner::returning(plan(6)),
            MockRetriever::live(),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        )
    }

    fn synthetic_retriever() -> SearchSourceRetriever {
        SearchSourceRetriever::new(
            None,
            Arc::new(SyntheticSearchProvider::new()),
            CredibilityConfig::default(),
            RetrieverConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_research_creates_session_with_one_turn() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store.clone());

        let result = orchestrator.research("What is Rust?").await.unwrap();

        assert!(!result.is_follow_up);
        assert_eq!(result.sources.len(), 6);
        assert_eq!(result.report.citations().len(), result.sources.len());
        assert!(result.warnings.is_empty());

        let record = store.get(&result.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_search_disabled_quantum_computing() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = ResearchOrchestrator::new(
            Arc::new(MockPlanner::failing()),
            Arc::new(synthetic_retriever()),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("What is quantum computing?").await.unwrap();

        assert_eq!(result.sources.len(), 5);
        assert!(result.sources.is_all_synthetic());
        assert!(result.sources.iter().all(|s| s.provenance() == Provenance::Synthetic));
        assert_eq!(result.report.citations().len(), 5);
        assert!(result.plan.is_fallback());
        assert!(result.warnings.iter().any(|w| w.stage == StageKind::Planning));
        assert!(result.warnings.iter().any(|w| w.stage == StageKind::Retrieval));
    }

    #[tokio::test]
    async fn test_credibility_is_non_increasing() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = ResearchOrchestrator::new(
            Arc::new(MockPlanner::returning(plan(10))),
            Arc::new(synthetic_retriever()),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("rust async runtimes").await.unwrap();
        let scores: Vec<f32> = result.sources.iter().map(|s| s.credibility()).collect();

        assert!(!scores.is_empty());
        assert!(scores.len() <= SourceBounds::default().max());
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store.clone());

        let result = orchestrator.research("").await;
        assert!(matches!(result, Err(ResearchError::Validation { .. })));

        let result = orchestrator.research("   ").await;
        assert!(matches!(result, Err(ResearchError::Validation { .. })));

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_unknown_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store);

        let result = orchestrator
            .follow_up("more detail", &SessionId::from("unknown"))
            .await;

        assert!(matches!(result, Err(ResearchError::SessionNotFound { .. })));
        assert!(orchestrator.session_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_appends_turn_with_prior_context() {
        let store = Arc::new(InMemorySessionStore::new());
        let synthesizer = Arc::new(MockSynthesizer::working());
        let planner = Arc::new(MockPlanner::returning(plan(5)));
        let orchestrator = ResearchOrchestrator::new(
            planner.clone(),
            Arc::new(MockRetriever::live()),
            synthesizer.clone(),
            store.clone(),
            OrchestratorConfig::default(),
        );

        let first = orchestrator.research("What is quantum computing?").await.unwrap();
        let second = orchestrator
            .follow_up("How does error correction work?", &first.session_id)
            .await
            .unwrap();

        assert!(second.is_follow_up);
        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.query, "How does error correction work?");

        let record = store.get(&first.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert!(record.last_accessed_at() >= record.created_at());

        let inputs = planner.inputs();
        assert!(inputs[0].prior.is_none());
        let prior = inputs[1].prior.as_ref().unwrap();
        assert_eq!(prior.query, "What is quantum computing?");
        assert_eq!(prior.focus_areas, plan(5).focus_areas());

        let synth_inputs = synthesizer.inputs();
        assert_eq!(
            synth_inputs[1].prior_findings,
            vec!["Finding about What is quantum computing?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_repeated_follow_up_is_deterministic() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = ResearchOrchestrator::new(
            Arc::new(MockPlanner::returning(plan(8))),
            Arc::new(synthetic_retriever()),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        );

        let first = orchestrator.research("quantum computing").await.unwrap();
        let a = orchestrator
            .follow_up("error correction", &first.session_id)
            .await
            .unwrap();
        let b = orchestrator
            .follow_up("error correction", &first.session_id)
            .await
            .unwrap();

        assert_eq!(a.sources.urls(), b.sources.urls());
    }

    #[tokio::test]
    async fn test_synthesis_failure_without_fallback_leaves_session_unchanged() {
        let store = Arc::new(InMemorySessionStore::new());
        let working = default_orchestrator(store.clone());
        let first = working.research("quantum computing").await.unwrap();

        let failing = orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::live(),
            Arc::new(MockSynthesizer::failing()),
            store.clone(),
            OrchestratorConfig::default().with_synthesis_fallback(false),
        );

        let result = failing.follow_up("more detail", &first.session_id).await;
        assert!(matches!(
            result,
            Err(ResearchError::Stage {
                stage: StageKind::Synthesis,
                ..
            })
        ));

        let record = store.get(&first.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 1);

        let result = failing.research("another question").await;
        assert!(result.is_err());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_degrades_to_extractive_report() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::live(),
            Arc::new(MockSynthesizer::failing()),
            store,
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("quantum computing").await.unwrap();

        assert!(result.report.is_extractive());
        assert_eq!(result.report.citations().len(), result.sources.len());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].stage, StageKind::Synthesis);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_planning_failure_without_fallback() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = orchestrator(
            MockPlanner::failing(),
            MockRetriever::live(),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default().with_planning_fallback(false),
        );

        let result = orchestrator.research("quantum computing").await;

        assert!(matches!(
            result,
            Err(ResearchError::Stage {
                stage: StageKind::Planning,
                ..
            })
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_fatal() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::failing(),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("quantum computing").await;

        assert!(matches!(result, Err(ResearchError::Retrieval { .. })));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_target_is_clamped() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = orchestrator(
            MockPlanner::returning(plan(50)),
            MockRetriever::live(),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("quantum computing").await.unwrap();

        assert_eq!(result.plan.target_source_count(), 10);
        assert_eq!(result.sources.len(), 10);
    }

    #[tokio::test]
    async fn test_concurrent_research_creates_distinct_sessions() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = Arc::new(orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::live().with_delay(Duration::from_millis(20)),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default(),
        ));

        let (a, b) = tokio::join!(
            orchestrator.research("first question"),
            orchestrator.research("second question")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.session_id, b.session_id);

        let sessions = store.list().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.turn_count == 1));
    }

    #[tokio::test]
    async fn test_concurrent_follow_ups_are_serialized() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = Arc::new(orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::live().with_delay(Duration::from_millis(10)),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default(),
        ));

        let first = orchestrator.research("quantum computing").await.unwrap();
        let id = first.session_id.clone();

        let (a, b) = tokio::join!(
            orchestrator.follow_up("qubits", &id),
            orchestrator.follow_up("gates", &id)
        );
        a.unwrap();
        b.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockSessionStore::new();
        store
            .expect_create()
            .returning(|_| Err(DomainError::internal("disk full")));

        let orchestrator = ResearchOrchestrator::new(
            Arc::new(MockPlanner::returning(plan(5))),
            Arc::new(MockRetriever::live()),
            Arc::new(MockSynthesizer::working()),
            Arc::new(store),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.research("quantum computing").await;
        assert!(matches!(result, Err(ResearchError::Store(_))));
    }

    #[tokio::test]
    async fn test_session_administration() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store);

        let first = orchestrator.research("quantum computing").await.unwrap();
        orchestrator.research("rust ownership").await.unwrap();

        assert_eq!(orchestrator.list_sessions().await.unwrap().len(), 2);
        assert_eq!(
            orchestrator.session(&first.session_id).await.unwrap().turn_count(),
            1
        );

        orchestrator.delete_session(&first.session_id).await.unwrap();
        assert!(matches!(
            orchestrator.session(&first.session_id).await,
            Err(ResearchError::SessionNotFound { .. })
        ));
        assert!(matches!(
            orchestrator.delete_session(&first.session_id).await,
            Err(ResearchError::SessionNotFound { .. })
        ));

        let evicted = orchestrator.evict_idle(Duration::ZERO).await.unwrap();
        assert_eq!(evicted.len(), 1);
        assert!(orchestrator.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_eviction_keeps_session_with_follow_up_in_flight() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = Arc::new(orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::live().with_delay(Duration::from_millis(100)),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default(),
        ));

        let first = orchestrator.research("quantum computing").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let follow_up = tokio::spawn({
            let orchestrator = orchestrator.clone();
            let id = first.session_id.clone();
            async move { orchestrator.follow_up("error correction", &id).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let evicted = orchestrator.evict_idle(Duration::ZERO).await.unwrap();
        assert!(evicted.is_empty());

        let second = follow_up.await.unwrap().unwrap();
        assert!(second.is_follow_up);

        let record = store.get(&first.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert!(orchestrator.session_locks.lock().await.is_empty());

        let evicted = orchestrator.evict_idle(Duration::ZERO).await.unwrap();
        assert_eq!(evicted, vec![first.session_id]);
    }

    #[tokio::test]
    async fn test_research_in_existing_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let planner = Arc::new(MockPlanner::returning(plan(5)));
        let orchestrator = ResearchOrchestrator::new(
            planner.clone(),
            Arc::new(MockRetriever::live()),
            Arc::new(MockSynthesizer::working()),
            store.clone(),
            OrchestratorConfig::default(),
        );

        let first = orchestrator.research("quantum computing").await.unwrap();
        let second = orchestrator
            .research_with(
                "rust ownership",
                ResearchOptions::default().in_session(first.session_id.clone()),
            )
            .await
            .unwrap();

        assert_eq!(second.session_id, first.session_id);
        assert!(!second.is_follow_up);
        assert_eq!(store.list().await.unwrap().len(), 1);

        let record = store.get(&first.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
        assert!(planner.inputs()[1].prior.is_none());
        assert!(orchestrator.session_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_research_in_unknown_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store.clone());

        let result = orchestrator
            .research_with(
                "quantum computing",
                ResearchOptions::default().in_session(SessionId::from("missing")),
            )
            .await;

        assert!(matches!(result, Err(ResearchError::SessionNotFound { .. })));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requested_source_count_is_clamped() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store);

        let result = orchestrator
            .research_with("quantum computing", ResearchOptions::default().with_num_sources(8))
            .await
            .unwrap();
        assert_eq!(result.plan.target_source_count(), 8);
        assert_eq!(result.sources.len(), 8);

        let result = orchestrator
            .research_with("quantum computing", ResearchOptions::default().with_num_sources(50))
            .await
            .unwrap();
        assert_eq!(result.plan.target_source_count(), 10);
        assert_eq!(result.sources.len(), 10);
    }

    fn document() -> Document {
        Document::new(
            "qec paper.pdf",
            crate::domain::DocumentKind::Pdf,
            "Surface codes protect logical qubits against physical errors.",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_document_creates_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let synthesizer = Arc::new(MockSynthesizer::working());
        let planner = Arc::new(MockPlanner::returning(plan(5)));
        let orchestrator = ResearchOrchestrator::new(
            planner.clone(),
            Arc::new(MockRetriever::failing()),
            synthesizer.clone(),
            store.clone(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator
            .upload_document(document(), "Summarize the paper")
            .await
            .unwrap();

        assert!(!result.is_follow_up);
        assert_eq!(result.document_name.as_deref(), Some("qec paper.pdf"));
        assert_eq!(result.sources.len(), 1);
        assert!(result.sources.iter().all(|s| s.is_uploaded_document()));
        assert_eq!(result.report.citations().len(), 1);
        assert!(result.warnings.is_empty());
        assert!(planner.inputs().is_empty());
        assert_eq!(
            synthesizer.inputs()[0].prior_findings,
            vec!["Document: qec paper.pdf".to_string()]
        );

        let record = store.get(&result.session_id).await.unwrap().unwrap();
        assert_eq!(record.document().map(|d| d.name()), Some("qec paper.pdf"));
    }

    #[tokio::test]
    async fn test_analyze_document_adds_supplementary_sources() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store.clone());

        let uploaded = orchestrator
            .upload_document(document(), "Summarize the paper")
            .await
            .unwrap();
        let analysis = orchestrator
            .analyze_document(&uploaded.session_id, "What are the open problems?")
            .await
            .unwrap();

        assert!(analysis.is_follow_up);
        assert_eq!(analysis.plan.target_source_count(), SUPPLEMENTARY_SOURCES);
        assert_eq!(analysis.sources.len(), SUPPLEMENTARY_SOURCES + 1);
        assert!(analysis.sources.as_slice()[0].is_uploaded_document());
        assert_eq!(analysis.document_name.as_deref(), Some("qec paper.pdf"));

        let record = store.get(&uploaded.session_id).await.unwrap().unwrap();
        assert_eq!(record.turn_count(), 2);
    }

    #[tokio::test]
    async fn test_analyze_document_survives_retrieval_failure() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = orchestrator(
            MockPlanner::returning(plan(5)),
            MockRetriever::failing(),
            Arc::new(MockSynthesizer::working()),
            store,
            OrchestratorConfig::default(),
        );

        let uploaded = orchestrator
            .upload_document(document(), "Summarize the paper")
            .await
            .unwrap();
        let analysis = orchestrator
            .analyze_document(&uploaded.session_id, "What are the open problems?")
            .await
            .unwrap();

        assert_eq!(analysis.sources.len(), 1);
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].stage, StageKind::Retrieval);
    }

    #[tokio::test]
    async fn test_analyze_document_requires_document() {
        let store = Arc::new(InMemorySessionStore::new());
        let orchestrator = default_orchestrator(store);

        let first = orchestrator.research("quantum computing").await.unwrap();

        let result = orchestrator
            .analyze_document(&first.session_id, "What are the open problems?")
            .await;
        assert!(matches!(result, Err(ResearchError::DocumentNotFound { .. })));

        let result = orchestrator
            .analyze_document(&SessionId::from("missing"), "anything")
            .await;
        assert!(matches!(result, Err(ResearchError::SessionNotFound { .. })));
    }
}
