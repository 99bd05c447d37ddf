use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::http_client::HttpClient;
use super::{GeminiProvider, OpenAiProvider};
use crate::config::{LlmConfig, LlmProviderKind};
use crate::domain::{DomainError, LlmProvider};

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the configured provider; fails when no API key is available
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DomainError::configuration("No LLM API key configured"))?;

        let http_client =
            HttpClient::with_timeout(Duration::from_secs(config.request_timeout_secs.max(1)))?;

        debug!(provider = ?config.provider, base_url = ?config.base_url, "Creating LLM provider");

        let provider: Arc<dyn LlmProvider> = match (config.provider, config.base_url.as_deref()) {
            (LlmProviderKind::Gemini, Some(base_url)) => Arc::new(GeminiProvider::with_base_url(
                http_client,
                api_key,
                base_url,
            )),
            (LlmProviderKind::Gemini, None) => Arc::new(GeminiProvider::new(http_client, api_key)),
            (LlmProviderKind::OpenAi, Some(base_url)) => Arc::new(OpenAiProvider::with_base_url(
                http_client,
                api_key,
                base_url,
            )),
            (LlmProviderKind::OpenAi, None) => Arc::new(OpenAiProvider::new(http_client, api_key)),
        };

        Ok(provider)
    }

    /// Create a Gemini provider directly
    pub fn create_gemini(api_key: impl Into<String>) -> Arc<dyn LlmProvider> {
        Arc::new(GeminiProvider::new(HttpClient::new(), api_key))
    }

    /// Create an OpenAI provider directly
    pub fn create_openai(api_key: impl Into<String>) -> Arc<dyn LlmProvider> {
        Arc::new(OpenAiProvider::new(HttpClient::new(), api_key))
    }
}
