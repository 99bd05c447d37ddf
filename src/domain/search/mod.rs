//! Web search domain models and traits

mod provider;

pub use provider::{RawSearchResult, SearchProvider};

#[cfg(test)]
pub use provider::MockSearchProvider;
