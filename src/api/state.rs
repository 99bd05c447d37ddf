//! Shared application state

use std::sync::Arc;

use crate::domain::ResearchOrchestrator;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<ResearchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<ResearchOrchestrator>) -> Self {
        Self { orchestrator }
    }
}
