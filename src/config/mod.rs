//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, LlmConfig, LlmProviderKind, LogFormat, LoggingConfig, PipelineConfig,
    SearchConfig, ServerConfig, SessionConfig,
};
