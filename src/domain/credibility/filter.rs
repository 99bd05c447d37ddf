//! Credibility scoring of raw search results

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::config::CredibilityConfig;
use crate::domain::research::domain_of;
use crate::domain::search::RawSearchResult;

/// Domains scored as curated reputable sources
const CURATED_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "britannica.com",
    "nature.com",
    "science.org",
    "arxiv.org",
    "scholar.google.com",
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "bbc.co.uk",
    "who.int",
    "ieee.org",
    "acm.org",
    "springer.com",
    "sciencedirect.com",
    "plos.org",
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "his", "how", "its", "may", "new", "now", "see", "who", "why",
    "did", "does", "what", "when", "where", "which", "with", "this", "that", "these", "those",
    "from", "into", "about", "there", "their", "them", "then", "than", "been", "being", "have",
    "will", "would", "should", "could", "more", "most", "some", "such", "also", "just", "like",
    "over", "very", "your", "they", "were",
];

const INSTITUTIONAL_LABELS: &[&str] = &["gov", "edu", "mil"];

/// Individual signals behind a credibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibilitySignals {
    pub domain: f32,
    pub rank: f32,
    pub relevance: f32,
}

/// A raw result with its credibility score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub result: RawSearchResult,
    /// Weighted score (0.0 - 1.0); 0 for malformed urls
    pub score: f32,
    /// `None` when the url could not be parsed
    pub signals: Option<CredibilitySignals>,
}

impl ScoredResult {
    pub fn is_well_formed(&self) -> bool {
        self.signals.is_some()
    }
}

/// Results split by the acceptance threshold, each in input order
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<ScoredResult>,
    pub rejected: Vec<ScoredResult>,
}

/// Significant terms of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms(Vec<String>);

impl QueryTerms {
    /// Lowercased alphanumeric words of length >= 3 excluding stop words, deduplicated
    pub fn from_query(query: &str) -> Self {
        let mut seen = HashSet::new();
        let terms = tokenize(query)
            .filter(|t| t.chars().count() >= 3 && !STOP_WORDS.contains(&t.as_str()))
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self(terms)
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fraction of terms present in `text`; 1.0 when there are no terms
    pub fn overlap(&self, text: &str) -> f32 {
        if self.0.is_empty() {
            return 1.0;
        }

        let words: HashSet<String> = tokenize(text).collect();
        let hits = self.0.iter().filter(|t| words.contains(*t)).count();
        hits as f32 / self.0.len() as f32
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Pure credibility filter over raw search results
#[derive(Debug, Clone, Default)]
pub struct CredibilityFilter {
    config: CredibilityConfig,
}

impl CredibilityFilter {
    pub fn new(config: CredibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CredibilityConfig {
        &self.config
    }

    /// Reputation of a bare host name
    pub fn domain_reputation(&self, domain: &str) -> f32 {
        let domain = domain.trim().to_lowercase();
        let labels: Vec<&str> = domain.split('.').collect();

        let institutional = match labels.as_slice() {
            [.., tld] if INSTITUTIONAL_LABELS.contains(tld) => true,
            // gov.uk, edu.au and similar
            [.., second, cc] if cc.len() == 2 && INSTITUTIONAL_LABELS.contains(second) => true,
            _ => false,
        };

        if institutional {
            1.0
        } else if self.is_curated(&domain) {
            0.9
        } else if domain.ends_with(".org") {
            0.7
        } else {
            0.5
        }
    }

    fn is_curated(&self, domain: &str) -> bool {
        let matches = |entry: &str| {
            domain == entry
                || domain
                    .strip_suffix(entry)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        };

        CURATED_DOMAINS.iter().copied().any(matches)
            || self.config.trusted_domains.iter().any(|d| matches(d.as_str()))
    }

    /// Rank signal for a 0-based provider rank
    pub fn rank_signal(rank: usize) -> f32 {
        1.0 / (1.0 + 0.25 * rank as f32)
    }

    /// Score a single result against pre-computed query terms
    pub fn score_one(&self, terms: &QueryTerms, result: &RawSearchResult) -> ScoredResult {
        let Some(domain) = domain_of(&result.url) else {
            return ScoredResult {
                result: result.clone(),
                score: 0.0,
                signals: None,
            };
        };

        let signals = CredibilitySignals {
            domain: self.domain_reputation(&domain),
            rank: Self::rank_signal(result.rank),
            relevance: terms.overlap(&format!("{} {}", result.title, result.snippet)),
        };

        let (wd, wr, wq) = self.config.normalized_weights();
        let score =
            (wd * signals.domain + wr * signals.rank + wq * signals.relevance).clamp(0.0, 1.0);

        ScoredResult {
            result: result.clone(),
            score,
            signals: Some(signals),
        }
    }

    /// Score every result, preserving input order
    pub fn score(&self, query: &str, results: &[RawSearchResult]) -> Vec<ScoredResult> {
        let terms = QueryTerms::from_query(query);
        results.iter().map(|r| self.score_one(&terms, r)).collect()
    }

    /// Whether a scored result passes the threshold
    pub fn accepts(&self, scored: &ScoredResult) -> bool {
        scored.is_well_formed() && scored.score >= self.config.effective_threshold()
    }

    /// Score and split results by the acceptance threshold
    pub fn filter(&self, query: &str, results: &[RawSearchResult]) -> FilterOutcome {
        let (accepted, rejected) = self
            .score(query, results)
            .into_iter()
            .partition(|s| self.accepts(s));

        FilterOutcome { accepted, rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, snippet: &str, rank: usize) -> RawSearchResult {
        RawSearchResult::new(title, url, snippet, rank)
    }

    #[test]
    fn test_domain_reputation_tiers() {
        let filter = CredibilityFilter::default();

        assert_eq!(filter.domain_reputation("nih.gov"), 1.0);
        assert_eq!(filter.domain_reputation("cs.stanford.edu"), 1.0);
        assert_eq!(filter.domain_reputation("army.mil"), 1.0);
        assert_eq!(filter.domain_reputation("service.gov.uk"), 1.0);
        assert_eq!(filter.domain_reputation("en.wikipedia.org"), 0.9);
        assert_eq!(filter.domain_reputation("nature.com"), 0.9);
        assert_eq!(filter.domain_reputation("mozilla.org"), 0.7);
        assert_eq!(filter.domain_reputation("randomblog.net"), 0.5);
        assert_eq!(filter.domain_reputation("notnature.com"), 0.5);
    }

    #[test]
    fn test_trusted_domains_extend_curated_list() {
        let filter =
            CredibilityFilter::new(CredibilityConfig::new().with_trusted_domain("docs.rs"));
        assert_eq!(filter.domain_reputation("docs.rs"), 0.9);
    }

    #[test]
    fn test_rank_signal() {
        assert_eq!(CredibilityFilter::rank_signal(0), 1.0);
        assert_eq!(CredibilityFilter::rank_signal(4), 0.5);
        assert!(CredibilityFilter::rank_signal(9) < CredibilityFilter::rank_signal(8));
    }

    #[test]
    fn test_query_terms() {
        let terms = QueryTerms::from_query("What is quantum computing? Quantum!");
        assert_eq!(terms.terms(), ["quantum", "computing"]);

        assert!(QueryTerms::from_query("is it so?").is_empty());
        assert_eq!(QueryTerms::from_query("is it so?").overlap("anything"), 1.0);
        assert_eq!(terms.overlap("Quantum physics"), 0.5);
    }

    #[test]
    fn test_malformed_urls_score_zero_and_are_rejected() {
        let filter = CredibilityFilter::new(CredibilityConfig::new().with_threshold(0.0));
        let outcome = filter.filter(
            "quantum computing",
            &[
                result("Quantum computing", "nih.gov/quantum", "quantum computing", 0),
                result("Quantum computing", "mailto:someone@nih.gov", "quantum computing", 1),
            ],
        );

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
        assert!(outcome.rejected.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn test_default_weights() {
        let filter = CredibilityFilter::default();
        let scored = filter.score(
            "quantum computing",
            &[result(
                "Quantum computing explained",
                "https://www.nih.gov/q",
                "An overview of quantum computing",
                0,
            )],
        );

        // all three signals at 1.0
        assert!((scored[0].score - 1.0).abs() < 1e-6);

        let scored = filter.score(
            "quantum computing",
            &[result("Cooking tips", "https://blog.example.net", "Pasta", 4)],
        );
        // 0.5 * 0.5 + 0.2 * 0.5 + 0.3 * 0.0
        assert!((scored[0].score - 0.35).abs() < 1e-6);
        assert!(!filter.accepts(&scored[0]));
    }

    #[test]
    fn test_filter_preserves_input_order() {
        let filter = CredibilityFilter::default();
        let outcome = filter.filter(
            "rust ownership",
            &[
                result("Rust ownership", "https://mozilla.org/rust", "rust ownership", 2),
                result("Nothing here", "https://spam.example.net", "buy now", 3),
                result("Rust ownership rules", "https://mit.edu/rust", "ownership", 1),
            ],
        );

        let urls: Vec<_> = outcome.accepted.iter().map(|s| s.result.url.as_str()).collect();
        assert_eq!(urls, vec!["https://mozilla.org/rust", "https://mit.edu/rust"]);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_scoring_is_pure() {
        let filter = CredibilityFilter::default();
        let results = vec![result("A", "https://arxiv.org/abs/1", "quantum", 3)];

        assert_eq!(filter.score("quantum", &results), filter.score("quantum", &results));
    }
}
