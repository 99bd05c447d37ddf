//! Research Assistant
//!
//! Answers research questions with a three-stage pipeline:
//! - Planning: a language model picks focus areas and a target source count
//! - Retrieval: web search per focus area, credibility filtering, synthetic fallback
//! - Synthesis: a language model writes a cited report
//!
//! Sessions keep every turn so follow-up questions build on earlier findings.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::{OrchestratorConfig, ResearchOrchestrator, SessionStore};
use infrastructure::llm::LlmProviderFactory;
use infrastructure::research::{
    LlmReportSynthesizer, LlmResearchPlanner, RetrieverConfig, SearchSourceRetriever,
};
use infrastructure::search::{SearchProviderFactory, SyntheticSearchProvider};
use infrastructure::session::{InMemorySessionStore, spawn_idle_sweeper};

/// Build the orchestrator with an in-memory session store
pub fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Arc<ResearchOrchestrator>> {
    build_orchestrator_with_store(config, Arc::new(InMemorySessionStore::new()))
}

/// Build the orchestrator on top of the given session store
///
/// Starts the idle sweeper when `session.max_idle_secs` is set, so this must
/// run inside a tokio runtime.
pub fn build_orchestrator_with_store(
    config: &AppConfig,
    store: Arc<dyn SessionStore>,
) -> anyhow::Result<Arc<ResearchOrchestrator>> {
    config.validate()?;
    config.require_llm_key()?;

    let pipeline = &config.pipeline;
    let llm = LlmProviderFactory::create(&config.llm)?;

    let planner = LlmResearchPlanner::new(
        llm.clone(),
        &config.llm.planner_model,
        pipeline.llm_timeout(),
    )
    .with_temperature(config.llm.temperature);

    let synthesizer = LlmReportSynthesizer::new(
        llm,
        &config.llm.synthesizer_model,
        pipeline.llm_timeout(),
    )
    .with_temperature(config.llm.temperature);

    let live_search = SearchProviderFactory::create(&config.search, pipeline.search_timeout())?;
    let retriever = SearchSourceRetriever::new(
        live_search,
        Arc::new(SyntheticSearchProvider::new()),
        config.credibility.clone(),
        RetrieverConfig::default()
            .with_concurrency(pipeline.search_concurrency)
            .with_search_timeout(pipeline.search_timeout())
            .with_max_query_chars(config.search.max_query_chars)
            .with_results_per_query(config.search.results_per_query)
            .with_fallback(config.search.fallback_enabled),
    );

    let orchestrator_config = OrchestratorConfig::default()
        .with_bounds(pipeline.bounds())
        .with_planning_fallback(pipeline.planning_fallback)
        .with_synthesis_fallback(pipeline.synthesis_fallback);

    let orchestrator = Arc::new(ResearchOrchestrator::new(
        Arc::new(planner),
        Arc::new(retriever),
        Arc::new(synthesizer),
        store,
        orchestrator_config,
    ));

    if let Some(max_idle) = config.session.max_idle() {
        info!(
            max_idle_secs = max_idle.as_secs(),
            "Evicting idle sessions in the background"
        );
        spawn_idle_sweeper(
            orchestrator.clone(),
            max_idle,
            config.session.sweep_interval(),
        );
    }

    Ok(orchestrator)
}
