//! LLM-backed planning stage

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::complete;
use crate::domain::research::{
    DEFAULT_TARGET_SOURCES, PlanningInput, PriorContext, ResearchPlan, ResearchPlanner,
    SourceBounds, StageFailure, StageKind,
};
use crate::domain::{LlmProvider, LlmRequest};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

const SYSTEM_PROMPT: &str = "You are a research coordinator. You turn a research question into a \
concise, strategic plan for web research.";

/// Plan fields as read from the model's reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPlan {
    pub strategy: String,
    pub num_sources: Option<usize>,
    pub focus_areas: Vec<String>,
    pub search_terms: Vec<String>,
}

/// Planner that asks a language model for a `STRATEGY:` style plan
#[derive(Debug)]
pub struct LlmResearchPlanner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl LlmResearchPlanner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            timeout,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    fn build_prompt(input: &PlanningInput) -> String {
        let bounds = input.bounds;
        let mut prompt = format!(
            "Analyze this research query and create a plan.\n\n\
             Query: \"{}\"\n\n\
             Reply using exactly these lines:\n\n\
             STRATEGY: <brief description of the research approach>\n\
             NUM_SOURCES: <recommended number of sources, {}-{}>\n\
             FOCUS_AREAS: <2-4 key aspects to research, comma separated>\n\
             SEARCH_TERMS: <3-5 optimized search terms, comma separated>\n",
            input.query,
            bounds.min(),
            bounds.max()
        );

        if let Some(prior) = &input.prior {
            prompt.push_str(&prior_section(prior));
        }

        prompt.push_str("\nBe concise and strategic.");
        prompt
    }
}

fn prior_section(prior: &PriorContext) -> String {
    let mut section = format!(
        "\nThis is a follow-up to the earlier question \"{}\".\n",
        prior.query
    );

    if !prior.focus_areas.is_empty() {
        section.push_str(&format!(
            "Already researched: {}.\n",
            prior.focus_areas.join(", ")
        ));
    }

    if !prior.key_findings.is_empty() {
        section.push_str("Do not plan to re-establish these known findings:\n");
        for finding in &prior.key_findings {
            section.push_str(&format!("- {}\n", finding));
        }
    }

    section.push_str("Choose focus areas that cover new ground.\n");
    section
}

/// Parse `KEY: value` plan lines; keys are case-insensitive and markdown emphasis is ignored
pub fn parse_plan(text: &str) -> ParsedPlan {
    let mut plan = ParsedPlan::default();

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| c == '#' || c == '-' || c == '*' || c.is_whitespace());

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim().trim_matches('*').trim().to_uppercase().replace(' ', "_");
        let value = value.trim().trim_matches('*').trim();

        match key.as_str() {
            "STRATEGY" => plan.strategy = value.to_string(),
            "NUM_SOURCES" => {
                plan.num_sources = NUMBER
                    .find(value)
                    .and_then(|m| m.as_str().parse::<usize>().ok());
            }
            "FOCUS_AREAS" => plan.focus_areas = split_list(value),
            "SEARCH_TERMS" => plan.search_terms = split_list(value),
            _ => {}
        }
    }

    plan
}

fn split_list(value: &str) -> Vec<String> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split([',', ';'])
        .map(|item| item.trim().trim_matches('"').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Turn parsed fields into a plan for `query`, dropping focus areas already covered
pub fn build_plan(
    parsed: ParsedPlan,
    query: &str,
    prior: Option<&PriorContext>,
    bounds: SourceBounds,
) -> Result<ResearchPlan, StageFailure> {
    if parsed.focus_areas.is_empty() {
        return Err(StageFailure::planning("plan response had no focus areas"));
    }

    let mut focus_areas: Vec<String> = match prior {
        Some(prior) => parsed
            .focus_areas
            .into_iter()
            .filter(|area| !prior.covers(area))
            .collect(),
        None => parsed.focus_areas,
    };

    if focus_areas.is_empty() {
        focus_areas.push(query.to_string());
    }

    let target = parsed.num_sources.unwrap_or(DEFAULT_TARGET_SOURCES);

    Ok(ResearchPlan::new(focus_areas, target)
        .with_strategy(parsed.strategy)
        .with_search_terms(parsed.search_terms)
        .clamp_target(bounds))
}

#[async_trait]
impl ResearchPlanner for LlmResearchPlanner {
    async fn plan(&self, input: &PlanningInput) -> Result<ResearchPlan, StageFailure> {
        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(Self::build_prompt(input))
            .temperature(self.temperature)
            .build();

        debug!(model = %self.model, query = %input.query, "Requesting research plan");

        let response = complete(
            self.provider.as_ref(),
            &self.model,
            request,
            self.timeout,
            StageKind::Planning,
        )
        .await?;

        let text = response
            .content()
            .ok_or_else(|| StageFailure::planning("planner returned an empty response"))?;

        let plan = build_plan(
            parse_plan(text),
            input.query.as_str(),
            input.prior.as_ref(),
            input.bounds,
        )?;

        info!(
            strategy = %plan.strategy(),
            focus_areas = plan.focus_areas().len(),
            target = plan.target_source_count(),
            "Created research plan"
        );

        Ok(plan)
    }
}
