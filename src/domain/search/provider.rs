//! Search provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// A single result as returned by a search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// 0-based position in the provider's ranking
    pub rank: usize,
}

impl RawSearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        rank: usize,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            rank,
        }
    }
}

/// Trait for web search backends
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search and return at most `num_results` results in rank order
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<RawSearchResult>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
