//! LLM-backed synthesis stage

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::complete;
use crate::domain::research::{
    MAX_KEY_FINDINGS, Report, ReportSynthesizer, SourceSet, StageFailure, StageKind,
    SynthesisInput,
};
use crate::domain::{LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You are a research analyst. You synthesize information from \
multiple sources into clear, accurate and well-structured reports.";

/// Longest line still treated as a section header
const MAX_HEADER_CHARS: usize = 40;

/// Sections as read from the model's reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReport {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub conclusion: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Summary,
    Findings,
    Conclusion,
}

/// Synthesizer that asks a language model for a sectioned report
#[derive(Debug)]
pub struct LlmReportSynthesizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl LlmReportSynthesizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            timeout,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    fn build_prompt(input: &SynthesisInput) -> String {
        let mut prompt = format!(
            "Research Query: \"{}\"\n\nSources:\n{}\n",
            input.query,
            format_sources(&input.sources)
        );

        if !input.prior_findings.is_empty() {
            prompt.push_str("\nAdditional Context:\n");
            for finding in &input.prior_findings {
                prompt.push_str(&format!("- {}\n", finding));
            }
            prompt.push_str("Build on this context instead of repeating it.\n");
        }

        prompt.push_str(
            "\nCreate a research report with these sections:\n\n\
             EXECUTIVE SUMMARY:\n\
             A 2-3 paragraph overview answering the query.\n\n\
             KEY FINDINGS:\n\
             5-7 bullet points, each starting with \"- \".\n\n\
             CONCLUSION:\n\
             A brief concluding paragraph.\n\n\
             Base every statement on the sources above. Do not list citations.",
        );
        prompt
    }
}

fn format_sources(sources: &SourceSet) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "[Source {}] {}\nURL: {}\nContent: {}\n",
                i + 1,
                s.title(),
                s.url(),
                s.snippet()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn header_of(line: &str) -> Option<(Section, &str)> {
    let line = line.trim();
    let marked = line.starts_with(['#', '*']);
    let stripped = line.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());

    let (head, rest) = match stripped.split_once(':') {
        Some((head, rest)) => (head, rest),
        None => (stripped, ""),
    };

    let head = head.trim().trim_matches('*').trim();
    if head.is_empty() || head.chars().count() > MAX_HEADER_CHARS {
        return None;
    }

    // bare lines without a colon are only headers when marked up or shouted
    if !stripped.contains(':') && !marked && head != head.to_uppercase() {
        return None;
    }

    let upper = head.to_uppercase();
    let section = if upper.contains("SUMMARY") {
        Section::Summary
    } else if upper.contains("FINDINGS") {
        Section::Findings
    } else if upper.contains("CONCLUSION") {
        Section::Conclusion
    } else {
        return None;
    };

    Some((section, rest.trim().trim_matches('*').trim()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ListMarker {
    Bullet,
    Numbered,
}

fn list_marker(line: &str) -> Option<ListMarker> {
    let line = line.trim();
    if line.starts_with("**") {
        return None;
    }
    if line.starts_with(['-', '•', '*']) {
        return Some(ListMarker::Bullet);
    }

    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    (rest.len() < line.len() && rest.starts_with(['.', ')'])).then_some(ListMarker::Numbered)
}

/// Letters before any colon are all upper case
fn is_shouted(line: &str) -> bool {
    let head = line.split(':').next().unwrap_or_default();
    let mut letters = head.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

/// List items only open a section when written in capitals, except numbered
/// section titles ahead of the findings
fn section_header(line: &str, current: Section) -> Option<(Section, &str)> {
    match list_marker(line) {
        None => header_of(line),
        Some(_) if is_shouted(line) => header_of(line),
        Some(ListMarker::Numbered) if current != Section::Findings => header_of(line),
        Some(_) => None,
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    let line = line.trim();
    let first = line.chars().next()?;

    if matches!(first, '-' | '•' | '*') {
        return Some(line.trim_start_matches(['-', '•', '*']).trim());
    }

    if first.is_ascii_digit() {
        let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
        if let Some(rest) = rest.strip_prefix(['.', ')']) {
            return Some(rest.trim());
        }
    }

    None
}

fn push_paragraph_line(target: &mut String, line: &str) {
    if line.is_empty() {
        if !target.is_empty() && !target.ends_with("\n\n") {
            target.push_str("\n\n");
        }
        return;
    }

    if !target.is_empty() && !target.ends_with('\n') {
        target.push(' ');
    }
    target.push_str(line);
}

/// Split a model reply into summary, findings and conclusion
pub fn parse_report(text: &str) -> ParsedReport {
    let mut report = ParsedReport::default();
    let mut section = Section::Summary;

    for raw in text.lines() {
        let line = raw.trim();

        if let Some((next, rest)) = section_header(line, section) {
            section = next;
            if rest.is_empty() {
                continue;
            }
            match section {
                Section::Findings => {
                    if let Some(finding) = bullet_text(rest) {
                        report.key_findings.push(finding.to_string());
                    } else {
                        report.key_findings.push(rest.to_string());
                    }
                }
                Section::Summary => push_paragraph_line(&mut report.summary, rest),
                Section::Conclusion => push_paragraph_line(&mut report.conclusion, rest),
            }
            continue;
        }

        match section {
            Section::Summary => push_paragraph_line(&mut report.summary, line),
            Section::Conclusion => push_paragraph_line(&mut report.conclusion, line),
            Section::Findings => {
                if let Some(finding) = bullet_text(line) {
                    if !finding.is_empty() {
                        report.key_findings.push(finding.to_string());
                    }
                } else if !line.is_empty() {
                    // wrapped bullet
                    match report.key_findings.last_mut() {
                        Some(last) => {
                            last.push(' ');
                            last.push_str(line);
                        }
                        None => report.key_findings.push(line.to_string()),
                    }
                }
            }
        }
    }

    report.summary = report.summary.trim().to_string();
    report.conclusion = report.conclusion.trim().to_string();
    report.key_findings.truncate(MAX_KEY_FINDINGS);

    if report.key_findings.is_empty() {
        report.key_findings = summary_sentences(&report.summary);
    }

    report
}

fn summary_sentences(summary: &str) -> Vec<String> {
    summary
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .take(MAX_KEY_FINDINGS)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ReportSynthesizer for LlmReportSynthesizer {
    async fn synthesize(&self, input: &SynthesisInput) -> Result<Report, StageFailure> {
        if input.sources.is_empty() {
            return Err(StageFailure::synthesis("no sources to synthesize"));
        }

        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(Self::build_prompt(input))
            .temperature(self.temperature)
            .build();

        debug!(
            model = %self.model,
            sources = input.sources.len(),
            "Requesting synthesis"
        );

        let response = complete(
            self.provider.as_ref(),
            &self.model,
            request,
            self.timeout,
            StageKind::Synthesis,
        )
        .await?;

        let parsed = parse_report(response.content().unwrap_or_default());
        if parsed.summary.is_empty() {
            return Err(StageFailure::synthesis("model returned no summary"));
        }

        let report = Report::new(
            parsed.summary,
            parsed.key_findings,
            parsed.conclusion,
            &input.sources,
        );

        info!(
            findings = report.key_findings().len(),
            citations = report.citations().len(),
            "Synthesized report"
        );

        Ok(report)
    }
}
