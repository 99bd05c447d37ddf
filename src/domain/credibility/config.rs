//! Credibility scoring configuration

use serde::{Deserialize, Serialize};

/// Weights and acceptance threshold for credibility scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityConfig {
    /// Minimum score a result needs to be admitted (0.0 - 1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Weight of the domain reputation signal
    #[serde(default = "default_domain_weight")]
    pub domain_weight: f32,
    /// Weight of the provider rank signal
    #[serde(default = "default_rank_weight")]
    pub rank_weight: f32,
    /// Weight of the query term overlap signal
    #[serde(default = "default_relevance_weight")]
    pub relevance_weight: f32,
    /// Extra domains treated as curated reputable sources
    #[serde(default)]
    pub trusted_domains: Vec<String>,
}

fn default_threshold() -> f32 {
    0.45
}

fn default_domain_weight() -> f32 {
    0.5
}

fn default_rank_weight() -> f32 {
    0.2
}

fn default_relevance_weight() -> f32 {
    0.3
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            domain_weight: default_domain_weight(),
            rank_weight: default_rank_weight(),
            relevance_weight: default_relevance_weight(),
            trusted_domains: Vec::new(),
        }
    }
}

impl CredibilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acceptance threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the signal weights; negative weights are treated as zero
    pub fn with_weights(mut self, domain: f32, rank: f32, relevance: f32) -> Self {
        self.domain_weight = domain.max(0.0);
        self.rank_weight = rank.max(0.0);
        self.relevance_weight = relevance.max(0.0);
        self
    }

    pub fn with_trusted_domain(mut self, domain: impl Into<String>) -> Self {
        self.trusted_domains.push(domain.into().trim().to_lowercase());
        self
    }

    /// Weights normalized to sum to one, or equal weights when all are zero
    pub fn normalized_weights(&self) -> (f32, f32, f32) {
        let domain = self.domain_weight.max(0.0);
        let rank = self.rank_weight.max(0.0);
        let relevance = self.relevance_weight.max(0.0);
        let total = domain + rank + relevance;

        if total <= f32::EPSILON {
            let third = 1.0 / 3.0;
            return (third, third, third);
        }

        (domain / total, rank / total, relevance / total)
    }

    /// Threshold clamped into range
    pub fn effective_threshold(&self) -> f32 {
        self.threshold.clamp(0.0, 1.0)
    }
}
