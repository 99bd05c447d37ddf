//! Web search provider implementations

mod google;
mod synthetic;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

pub use google::{GoogleSearchProvider, MAX_RESULTS_PER_REQUEST};
pub use synthetic::{SYNTHETIC_DOMAINS, SyntheticSearchProvider};

use crate::config::SearchConfig;
use crate::domain::{DomainError, SearchProvider};
use crate::infrastructure::llm::HttpClient;

/// Factory for the live search provider
#[derive(Debug)]
pub struct SearchProviderFactory;

impl SearchProviderFactory {
    /// Build the live provider, or `None` when search is disabled or lacks credentials
    pub fn create(
        config: &SearchConfig,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn SearchProvider>>, DomainError> {
        if !config.enabled {
            info!("Live search disabled; using synthetic sources");
            return Ok(None);
        }

        let (Some(api_key), Some(engine_id)) = (&config.api_key, &config.engine_id) else {
            warn!(
                "Search credentials missing (GOOGLE_SEARCH_API_KEY / GOOGLE_SEARCH_ENGINE_ID); \
                 using synthetic sources"
            );
            return Ok(None);
        };

        let client = HttpClient::with_timeout(timeout)?;
        let provider =
            GoogleSearchProvider::with_base_url(client, api_key, engine_id, &config.base_url);

        Ok(Some(Arc::new(provider)))
    }
}
