//! Multi-stage research pipeline

mod error;
mod orchestrator;
mod plan;
mod query;
mod report;
mod result;
mod source;
mod stage;

pub use error::{ResearchError, StageFailure, StageKind, StageWarning};
pub use orchestrator::{
    OrchestratorConfig, ResearchOptions, ResearchOrchestrator, SUPPLEMENTARY_SOURCES,
};
pub use plan::{DEFAULT_TARGET_SOURCES, PriorContext, ResearchPlan, SourceBounds};
pub use query::{MAX_QUERY_CHARS, Query, SessionId};
pub use report::{MAX_KEY_FINDINGS, Report, format_citation, organization_for};
pub use result::ResearchResult;
pub use source::{
    Provenance, Source, SourceSet, SourceSetProvenance, UPLOADED_DOCUMENT_DOMAIN, domain_of,
};
pub use stage::{
    PlanningInput, ReportSynthesizer, ResearchPlanner, RetrievalInput, RetrievalOutput,
    SourceRetriever, SynthesisInput,
};

#[cfg(test)]
pub use stage::mock;
