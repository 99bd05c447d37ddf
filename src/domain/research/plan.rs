//! Research plan produced by the planning stage

use serde::{Deserialize, Serialize};

use super::query::Query;

/// Target source count used by the fallback plan
pub const DEFAULT_TARGET_SOURCES: usize = 5;

const FALLBACK_STRATEGY: &str = "comprehensive web research";

/// Inclusive bounds for a plan's target source count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBounds {
    min: usize,
    max: usize,
}

impl SourceBounds {
    /// Create bounds; reversed arguments are swapped and zero is raised to one
    pub fn new(min: usize, max: usize) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.max(1),
            max: max.max(1),
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn clamp(&self, count: usize) -> usize {
        count.clamp(self.min, self.max)
    }
}

impl Default for SourceBounds {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

/// Focus areas and target source count for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    strategy: String,
    focus_areas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    search_terms: Vec<String>,
    target_source_count: usize,
    #[serde(default)]
    is_fallback: bool,
}

impl ResearchPlan {
    /// Create a plan; blank focus areas are dropped
    pub fn new(focus_areas: Vec<String>, target_source_count: usize) -> Self {
        Self {
            strategy: String::new(),
            focus_areas: clean_list(focus_areas),
            search_terms: Vec::new(),
            target_source_count,
            is_fallback: false,
        }
    }

    /// Default plan used when the planner cannot produce one
    pub fn fallback(query: &Query) -> Self {
        Self {
            strategy: FALLBACK_STRATEGY.to_string(),
            focus_areas: vec![query.as_str().to_string()],
            search_terms: vec![query.as_str().to_string()],
            target_source_count: DEFAULT_TARGET_SOURCES,
            is_fallback: true,
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into().trim().to_string();
        self
    }

    pub fn with_search_terms(mut self, terms: Vec<String>) -> Self {
        self.search_terms = clean_list(terms);
        self
    }

    /// Replace the target source count, e.g. with a caller's request
    pub fn with_target(mut self, count: usize) -> Self {
        self.target_source_count = count;
        self
    }

    pub fn clamp_target(mut self, bounds: SourceBounds) -> Self {
        self.target_source_count = bounds.clamp(self.target_source_count);
        self
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn focus_areas(&self) -> &[String] {
        &self.focus_areas
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search_terms
    }

    pub fn target_source_count(&self) -> usize {
        self.target_source_count
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }
}

/// Context carried from the latest turn of a session into a follow-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorContext {
    pub query: String,
    pub focus_areas: Vec<String>,
    pub key_findings: Vec<String>,
}

impl PriorContext {
    /// Whether a candidate focus area repeats one already covered
    pub fn covers(&self, focus_area: &str) -> bool {
        let candidate = normalize(focus_area);
        candidate == normalize(&self.query)
            || self.focus_areas.iter().any(|a| normalize(a) == candidate)
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
