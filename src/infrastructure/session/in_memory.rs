//! In-memory session store

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{DomainError, SessionId, SessionRecord, SessionStore, SessionSummary, Turn};

/// Process-lifetime session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl InMemorySessionStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, record: SessionRecord) -> Result<SessionRecord, DomainError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(record.id()) {
            return Err(DomainError::conflict(format!(
                "Session with id '{}' already exists",
                record.id()
            )));
        }

        sessions.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn append_turn(&self, id: &SessionId, turn: Turn) -> Result<SessionRecord, DomainError> {
        let mut sessions = self.sessions.write().await;

        let record = sessions
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("Session with id '{}' not found", id)))?;

        record.append(turn);
        Ok(record.clone())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, DomainError> {
        let sessions = self.sessions.read().await;

        let mut summaries: Vec<SessionSummary> =
            sessions.values().map(SessionRecord::summary).collect();
        summaries.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));

        Ok(summaries)
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, DomainError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn evict_idle(
        &self,
        cutoff: DateTime<Utc>,
        keep: &HashSet<SessionId>,
    ) -> Result<Vec<SessionId>, DomainError> {
        let mut sessions = self.sessions.write().await;

        let idle: Vec<SessionId> = sessions
            .values()
            .filter(|r| r.is_idle_since(cutoff) && !keep.contains(r.id()))
            .map(|r| r.id().clone())
            .collect();

        for id in &idle {
            sessions.remove(id);
        }

        Ok(idle)
    }
}
