use std::time::Duration;

use serde::Deserialize;

use crate::domain::research::SourceBounds;
use crate::domain::{CredibilityConfig, DomainError};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub credibility: CredibilityConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

/// Language model settings shared by the planner and synthesizer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    pub planner_model: String,
    pub synthesizer_model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

/// Web search settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
    pub base_url: String,
    /// Results requested per derived query; the provider caps this at 10
    pub results_per_query: usize,
    /// Substitute synthetic results when live search fails
    pub fallback_enabled: bool,
    pub max_query_chars: usize,
}

/// Pipeline bounds, timeouts and fallback policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_sources: usize,
    pub max_sources: usize,
    pub search_concurrency: usize,
    pub llm_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub planning_fallback: bool,
    pub synthesis_fallback: bool,
}

/// Session retention
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted; unset keeps them forever
    pub max_idle_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            api_key: None,
            base_url: None,
            planner_model: "gemini-2.5-flash-lite".to_string(),
            synthesizer_model: "gemini-2.5-flash".to_string(),
            temperature: 0.3,
            request_timeout_secs: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            engine_id: None,
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            results_per_query: 10,
            fallback_enabled: true,
            max_query_chars: 128,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_sources: 5,
            max_sources: 10,
            search_concurrency: 4,
            llm_timeout_secs: 45,
            search_timeout_secs: 15,
            planning_fallback: true,
            synthesis_fallback: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: None,
            sweep_interval_secs: 60,
        }
    }
}

impl SearchConfig {
    /// Live search needs both credentials
    pub fn is_configured(&self) -> bool {
        self.enabled && self.api_key.is_some() && self.engine_id.is_some()
    }
}

impl PipelineConfig {
    pub fn bounds(&self) -> SourceBounds {
        SourceBounds::new(self.min_sources, self.max_sources)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

impl SessionConfig {
    pub fn max_idle(&self) -> Option<Duration> {
        self.max_idle_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_credential_fallbacks(|name| std::env::var(name).ok());

        Ok(app_config)
    }

    /// Fill missing credentials from the conventional Google/OpenAI variables
    pub fn apply_credential_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let provider = self.llm.provider;

        self.llm.api_key = non_empty(self.llm.api_key.take()).or_else(|| match provider {
            LlmProviderKind::Gemini => lookup("GOOGLE_API_KEY"),
            LlmProviderKind::OpenAi => lookup("OPENAI_API_KEY"),
        });
        self.search.api_key =
            non_empty(self.search.api_key.take()).or_else(|| lookup("GOOGLE_SEARCH_API_KEY"));
        self.search.engine_id =
            non_empty(self.search.engine_id.take()).or_else(|| lookup("GOOGLE_SEARCH_ENGINE_ID"));
    }

    /// Check settings the pipeline cannot run without
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.pipeline.search_concurrency == 0 {
            return Err(DomainError::configuration(
                "pipeline.search_concurrency must be at least 1",
            ));
        }

        if self.pipeline.llm_timeout_secs == 0 || self.pipeline.search_timeout_secs == 0 {
            return Err(DomainError::configuration(
                "pipeline timeouts must be greater than zero",
            ));
        }

        if !(0.0..=1.0).contains(&self.credibility.threshold) {
            return Err(DomainError::configuration(
                "credibility.threshold must be between 0 and 1",
            ));
        }

        Ok(())
    }

    /// LLM credentials are required to run the pipeline
    pub fn require_llm_key(&self) -> Result<&str, DomainError> {
        self.llm.api_key.as_deref().ok_or_else(|| {
            let hint = match self.llm.provider {
                LlmProviderKind::Gemini => "GOOGLE_API_KEY",
                LlmProviderKind::OpenAi => "OPENAI_API_KEY",
            };
            DomainError::configuration(format!(
                "No LLM API key configured; set APP__LLM__API_KEY or {hint}"
            ))
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
