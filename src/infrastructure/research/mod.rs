//! Stage implementations backed by language models and web search

mod planner;
mod retriever;
mod synthesizer;

pub use planner::{LlmResearchPlanner, ParsedPlan, build_plan, parse_plan};
pub use retriever::{RetrieverConfig, SearchSourceRetriever, derive_queries};
pub use synthesizer::{LlmReportSynthesizer, ParsedReport, parse_report};

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::research::{StageFailure, StageKind};
use crate::domain::{FinishReason, LlmProvider, LlmRequest, LlmResponse};

/// One model call bounded by `timeout`, with provider errors mapped to `stage`
async fn complete(
    provider: &dyn LlmProvider,
    model: &str,
    request: LlmRequest,
    timeout: Duration,
    stage: StageKind,
) -> Result<LlmResponse, StageFailure> {
    let response = tokio::time::timeout(timeout, provider.chat(model, request))
        .await
        .map_err(|_| StageFailure::timeout(stage, timeout))?
        .map_err(|e| StageFailure::from_domain(stage, e))?;

    if let Some(usage) = &response.usage {
        debug!(
            stage = %stage,
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Model call complete"
        );
    }

    if response.finish_reason == Some(FinishReason::Length) {
        warn!(stage = %stage, model = %model, "Model output was truncated");
    }

    Ok(response)
}
