//! Domain layer - Core research entities, stage contracts and the orchestrator

pub mod credibility;
pub mod document;
pub mod error;
pub mod llm;
pub mod research;
pub mod search;
pub mod session;

pub use credibility::{CredibilityConfig, CredibilityFilter, ScoredResult};
pub use document::{Document, DocumentKind};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use research::{
    OrchestratorConfig, Provenance, Query, Report, ResearchError, ResearchOptions,
    ResearchOrchestrator, ResearchPlan, ResearchResult, SessionId, Source, SourceSet, StageKind,
    StageWarning,
};
pub use search::{RawSearchResult, SearchProvider};
pub use session::{SessionRecord, SessionStore, SessionSummary, Turn};
