//! Source credibility scoring

mod config;
mod filter;

pub use config::CredibilityConfig;
pub use filter::{CredibilityFilter, CredibilitySignals, FilterOutcome, QueryTerms, ScoredResult};
