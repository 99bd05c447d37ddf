//! Synthesized research report

use serde::{Deserialize, Serialize};

use super::source::{Source, SourceSet};

/// Maximum number of key findings kept on a report
pub const MAX_KEY_FINDINGS: usize = 7;

/// Publishers cited by name instead of by domain
const ORGANIZATIONS: &[(&str, &str)] = &[
    ("wikipedia.org", "Wikipedia"),
    ("britannica.com", "Encyclopaedia Britannica"),
    ("nature.com", "Nature"),
    ("science.org", "Science"),
    ("arxiv.org", "arXiv"),
    ("scholar.google.com", "Google Scholar"),
    ("nih.gov", "National Institutes of Health"),
    ("mit.edu", "Massachusetts Institute of Technology"),
    ("stanford.edu", "Stanford University"),
    ("reuters.com", "Reuters"),
    ("bbc.com", "BBC"),
    ("bbc.co.uk", "BBC"),
    ("who.int", "World Health Organization"),
];

/// Final output of the synthesis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    summary: String,
    key_findings: Vec<String>,
    conclusion: String,
    citations: Vec<String>,
    #[serde(default)]
    is_extractive: bool,
}

impl Report {
    /// Build a report; citations are derived from `sources` in order
    pub fn new(
        summary: impl Into<String>,
        key_findings: Vec<String>,
        conclusion: impl Into<String>,
        sources: &SourceSet,
    ) -> Self {
        let key_findings = key_findings
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .take(MAX_KEY_FINDINGS)
            .collect();

        Self {
            summary: summary.into().trim().to_string(),
            key_findings,
            conclusion: conclusion.into().trim().to_string(),
            citations: sources.iter().map(format_citation).collect(),
            is_extractive: false,
        }
    }

    /// Degraded report built from titles and snippets alone
    pub fn extractive(sources: &SourceSet) -> Self {
        let summary = sources
            .iter()
            .map(|s| match s.snippet() {
                "" => s.title().to_string(),
                snippet => format!("{}: {}", s.title(), snippet),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let findings = sources
            .iter()
            .map(|s| s.snippet())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mut report = Self::new(
            summary,
            findings,
            "Automated synthesis was unavailable; this summary lists the retrieved sources verbatim.",
            sources,
        );
        report.is_extractive = true;
        report
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn key_findings(&self) -> &[String] {
        &self.key_findings
    }

    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    pub fn is_extractive(&self) -> bool {
        self.is_extractive
    }
}

/// Organization name for a known publisher domain
pub fn organization_for(domain: &str) -> Option<&'static str> {
    ORGANIZATIONS
        .iter()
        .find(|(d, _)| {
            domain == *d
                || domain
                    .strip_suffix(d)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
        .map(|(_, name)| *name)
}

/// `"{organization or domain}. {title}. {url}. Accessed {YYYY-MM-DD}."`
pub fn format_citation(source: &Source) -> String {
    let publisher = organization_for(source.domain()).unwrap_or(source.domain());
    let title = source.title().trim_end_matches('.');

    format!(
        "{}. {}. {}. Accessed {}.",
        publisher,
        title,
        source.url(),
        source.retrieved_at().format("%Y-%m-%d")
    )
}
