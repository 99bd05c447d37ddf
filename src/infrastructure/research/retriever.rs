//! Search-backed retrieval stage

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::credibility::QueryTerms;
use crate::domain::research::{
    Provenance, RetrievalInput, RetrievalOutput, Source, SourceRetriever, SourceSet,
    StageFailure, StageKind, StageWarning,
};
use crate::domain::{CredibilityConfig, CredibilityFilter, RawSearchResult, SearchProvider};

/// Retrieval tuning
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub concurrency: usize,
    pub search_timeout: Duration,
    pub max_query_chars: usize,
    pub results_per_query: usize,
    pub fallback_enabled: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            search_timeout: Duration::from_secs(15),
            max_query_chars: 128,
            results_per_query: 10,
            fallback_enabled: true,
        }
    }
}

impl RetrieverConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_max_query_chars(mut self, max: usize) -> Self {
        self.max_query_chars = max.max(1);
        self
    }

    pub fn with_results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n.max(1);
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }
}

/// Results of one derived query, tagged with where they came from
#[derive(Debug)]
struct QueryResults {
    query: String,
    results: Vec<RawSearchResult>,
    provenance: Provenance,
    warning: Option<StageWarning>,
}

/// Retriever that searches each focus area and keeps credible sources
pub struct SearchSourceRetriever {
    live: Option<Arc<dyn SearchProvider>>,
    fallback: Arc<dyn SearchProvider>,
    filter: CredibilityFilter,
    config: RetrieverConfig,
}

impl std::fmt::Debug for SearchSourceRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSourceRetriever")
            .field("live", &self.live.as_ref().map(|p| p.provider_name()))
            .field("fallback", &self.fallback.provider_name())
            .field("filter", &self.filter)
            .field("config", &self.config)
            .finish()
    }
}

impl SearchSourceRetriever {
    /// `live` is `None` when search is disabled; every query then uses `fallback`
    pub fn new(
        live: Option<Arc<dyn SearchProvider>>,
        fallback: Arc<dyn SearchProvider>,
        credibility: CredibilityConfig,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            live,
            fallback,
            filter: CredibilityFilter::new(credibility),
            config,
        }
    }

    async fn search_synthetic(&self, query: &str) -> Result<Vec<RawSearchResult>, StageFailure> {
        self.fallback
            .search(query, self.config.results_per_query)
            .await
            .map_err(|e| StageFailure::from_domain(StageKind::Retrieval, e))
    }

    async fn search_one(
        &self,
        live: &Arc<dyn SearchProvider>,
        query: String,
    ) -> Result<QueryResults, StageFailure> {
        let outcome = tokio::time::timeout(
            self.config.search_timeout,
            live.search(&query, self.config.results_per_query),
        )
        .await;

        let reason = match outcome {
            Ok(Ok(results)) => {
                debug!(query = %query, results = results.len(), "Live search returned");
                return Ok(QueryResults {
                    query,
                    results,
                    provenance: Provenance::Live,
                    warning: None,
                });
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "timed out after {}ms",
                self.config.search_timeout.as_millis()
            ),
        };

        if !self.config.fallback_enabled {
            return Err(StageFailure::retrieval(format!(
                "search for \"{}\" failed: {}",
                query, reason
            )));
        }

        warn!(query = %query, reason = %reason, "Live search failed; using synthetic sources");
        let results = self.search_synthetic(&query).await?;

        Ok(QueryResults {
            warning: Some(StageWarning::new(
                StageKind::Retrieval,
                format!("search for \"{}\" failed ({}); using synthetic sources", query, reason),
            )),
            query,
            results,
            provenance: Provenance::Synthetic,
        })
    }

    async fn search_all(&self, queries: Vec<String>) -> Result<Vec<QueryResults>, StageFailure> {
        match &self.live {
            Some(live) => {
                stream::iter(queries.into_iter().map(|q| self.search_one(live, q)))
                    .buffered(self.config.concurrency.max(1))
                    .collect::<Vec<_>>()
                    .await
                    .into_iter()
                    .collect()
            }
            None => self.search_all_synthetic(queries).await,
        }
    }

    async fn search_all_synthetic(
        &self,
        queries: Vec<String>,
    ) -> Result<Vec<QueryResults>, StageFailure> {
        let mut batches = Vec::with_capacity(queries.len());
        for query in queries {
            let results = self.search_synthetic(&query).await?;
            batches.push(QueryResults {
                query,
                results,
                provenance: Provenance::Synthetic,
                warning: None,
            });
        }
        Ok(batches)
    }

    /// Merge batches, score each result against its own query and admit the credible ones
    fn admit(&self, batches: &[QueryResults], limit: usize) -> SourceSet {
        let retrieved_at = Utc::now();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut rejected = 0usize;

        for batch in batches {
            let terms = QueryTerms::from_query(&batch.query);

            for result in &batch.results {
                if !seen.insert(result.url.trim().to_string()) {
                    continue;
                }

                let scored = self.filter.score_one(&terms, result);
                if !self.filter.accepts(&scored) {
                    rejected += 1;
                    continue;
                }

                match Source::admit(result, scored.score, batch.provenance, retrieved_at) {
                    Ok(source) => candidates.push(source),
                    Err(_) => rejected += 1,
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            rejected, "Credibility filter applied"
        );

        SourceSet::from_candidates(candidates, limit)
    }
}

/// One search query per focus area, bounded and deduplicated
pub fn derive_queries(query: &str, focus_areas: &[String], max_chars: usize) -> Vec<String> {
    let query = collapse_whitespace(query);
    let query_lower = query.to_lowercase();
    let mut seen = HashSet::new();

    let areas: Vec<String> = if focus_areas.is_empty() {
        vec![query.clone()]
    } else {
        focus_areas.to_vec()
    };

    areas
        .iter()
        .map(|area| {
            let area = collapse_whitespace(area);
            let combined = if area.to_lowercase().contains(&query_lower) {
                area
            } else {
                format!("{} {}", query, area)
            };
            truncate_chars(combined.trim(), max_chars)
        })
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.to_lowercase()))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl SourceRetriever for SearchSourceRetriever {
    async fn retrieve(&self, input: &RetrievalInput) -> Result<RetrievalOutput, StageFailure> {
        let limit = input.plan.target_source_count();
        let queries = derive_queries(
            input.query.as_str(),
            input.plan.focus_areas(),
            self.config.max_query_chars,
        );

        info!(queries = queries.len(), target = limit, "Searching sources");

        let mut warnings = Vec::new();
        if self.live.is_none() {
            warnings.push(StageWarning::new(
                StageKind::Retrieval,
                "live search not configured; using synthetic sources",
            ));
        }

        let batches = self.search_all(queries.clone()).await?;
        warnings.extend(batches.iter().filter_map(|b| b.warning.clone()));

        let mut sources = self.admit(&batches, limit);
        let used_live = batches.iter().any(|b| b.provenance == Provenance::Live);

        if sources.is_empty() && used_live && self.config.fallback_enabled {
            warn!("No credible live sources; retrying with synthetic sources");
            warnings.push(StageWarning::new(
                StageKind::Retrieval,
                "no credible live sources; using synthetic sources",
            ));

            let batches = self.search_all_synthetic(queries).await?;
            sources = self.admit(&batches, limit);
        }

        if sources.is_empty() {
            return Err(StageFailure::retrieval("no credible sources found"));
        }

        info!(
            sources = sources.len(),
            synthetic = sources.synthetic_count(),
            "Retrieved sources"
        );

        Ok(RetrievalOutput { sources, warnings })
    }
}
