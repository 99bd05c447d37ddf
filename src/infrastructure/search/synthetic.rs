use async_trait::async_trait;
use reqwest::Url;

use crate::domain::{DomainError, RawSearchResult, SearchProvider};

/// Reference domains cycled by the synthetic provider
pub const SYNTHETIC_DOMAINS: [&str; 10] = [
    "wikipedia.org",
    "britannica.com",
    "nature.com",
    "science.org",
    "arxiv.org",
    "scholar.google.com",
    "nih.gov",
    "mit.edu",
    "stanford.edu",
    "reuters.com",
];

/// Deterministic stand-in used when live search is unavailable
#[derive(Debug, Clone, Default)]
pub struct SyntheticSearchProvider;

impl SyntheticSearchProvider {
    pub fn new() -> Self {
        Self
    }

    /// Result `index` for `query`; pure
    pub fn result(query: &str, index: usize) -> Result<RawSearchResult, DomainError> {
        let domain = SYNTHETIC_DOMAINS[index % SYNTHETIC_DOMAINS.len()];
        let cycle = index / SYNTHETIC_DOMAINS.len();

        let base = format!("https://{}/search", domain);
        let page = (cycle + 1).to_string();
        let url = if cycle == 0 {
            Url::parse_with_params(&base, &[("q", query)])
        } else {
            Url::parse_with_params(&base, &[("q", query), ("page", page.as_str())])
        }
        .map_err(|e| DomainError::internal(format!("Failed to build synthetic url: {}", e)))?;

        Ok(RawSearchResult::new(
            format!("Research on {} - Source {}", query, index + 1),
            url.to_string(),
            format!("Information and research related to {}", query),
            index,
        ))
    }
}

#[async_trait]
impl SearchProvider for SyntheticSearchProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<RawSearchResult>, DomainError> {
        (0..num_results).map(|i| Self::result(query, i)).collect()
    }

    fn provider_name(&self) -> &'static str {
        "synthetic"
    }
}
