use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, RawSearchResult, SearchProvider};
use crate::infrastructure::llm::HttpClientTrait;

const DEFAULT_GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The Custom Search API returns at most ten results per request
pub const MAX_RESULTS_PER_REQUEST: usize = 10;

/// Google Custom Search JSON API provider
#[derive(Debug)]
pub struct GoogleSearchProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    engine_id: String,
    base_url: String,
}

impl<C: HttpClientTrait> GoogleSearchProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, engine_id, DEFAULT_GOOGLE_SEARCH_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_response(json: serde_json::Value) -> Result<Vec<RawSearchResult>, DomainError> {
        let response: GoogleSearchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("google_search", format!("Failed to parse response: {}", e))
        })?;

        Ok(response
            .items
            .into_iter()
            .enumerate()
            .map(|(rank, item)| RawSearchResult::new(item.title, item.link, item.snippet, rank))
            .collect())
    }
}

#[async_trait]
impl<C: HttpClientTrait> SearchProvider for GoogleSearchProvider<C> {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<RawSearchResult>, DomainError> {
        if num_results == 0 {
            return Ok(Vec::new());
        }

        let num = num_results.min(MAX_RESULTS_PER_REQUEST);
        let params = [
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", query.to_string()),
            ("num", num.to_string()),
        ];

        let json = self.client.get_json(&self.base_url, &params).await?;
        let results = Self::parse_response(json)?;

        debug!(query = %query, results = results.len(), "Google search completed");

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "google_search"
    }
}

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchItem {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}
