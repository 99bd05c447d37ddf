//! Session store trait

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::{SessionRecord, SessionSummary, Turn};
use crate::domain::research::SessionId;
use crate::domain::DomainError;

/// Keyed store of research sessions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new record; fails with `Conflict` if the id exists
    async fn create(&self, record: SessionRecord) -> Result<SessionRecord, DomainError>;

    /// Finds a record by ID
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, DomainError>;

    /// Appends one turn and refreshes `last_accessed_at`; fails with `NotFound`
    async fn append_turn(&self, id: &SessionId, turn: Turn) -> Result<SessionRecord, DomainError>;

    /// Lists summaries, most recently accessed first
    async fn list(&self) -> Result<Vec<SessionSummary>, DomainError>;

    /// Deletes a record; returns whether it existed
    async fn delete(&self, id: &SessionId) -> Result<bool, DomainError>;

    /// Removes records last accessed before `cutoff`, except those in `keep`
    async fn evict_idle(
        &self,
        cutoff: DateTime<Utc>,
        keep: &HashSet<SessionId>,
    ) -> Result<Vec<SessionId>, DomainError>;
}
