//! Terminal rendering of research results

use colored::Colorize;

use crate::domain::research::SourceSetProvenance;
use crate::domain::{Provenance, ResearchResult};

/// Renders results for the terminal
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    color: bool,
}

impl Formatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warning(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn error(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn info(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    /// Full report with findings, sources and citations
    pub fn render(&self, result: &ResearchResult) -> String {
        let report = &result.report;
        let mut out = String::new();

        let title = if result.is_follow_up {
            format!("Follow-up: {}", result.query)
        } else {
            format!("Research: {}", result.query)
        };
        out.push_str(&self.heading(&title));
        out.push('\n');
        out.push_str(&self.dim(&format!("Session {}", result.session_id)));
        if let Some(name) = &result.document_name {
            out.push('\n');
            out.push_str(&self.dim(&format!("Document {}", name)));
        }
        out.push_str("\n\n");

        for warning in &result.warnings {
            out.push_str(&self.warning(&format!("! {}", warning)));
            out.push('\n');
        }
        if !result.warnings.is_empty() {
            out.push('\n');
        }

        out.push_str(&self.heading("Summary"));
        out.push('\n');
        out.push_str(report.summary());
        out.push_str("\n\n");

        if !report.key_findings().is_empty() {
            out.push_str(&self.heading("Key Findings"));
            out.push('\n');
            for finding in report.key_findings() {
                out.push_str(&format!("  - {}\n", finding));
            }
            out.push('\n');
        }

        if !report.conclusion().is_empty() {
            out.push_str(&self.heading("Conclusion"));
            out.push('\n');
            out.push_str(report.conclusion());
            out.push_str("\n\n");
        }

        let provenance = match result.provenance() {
            SourceSetProvenance::Live => "live search",
            SourceSetProvenance::Synthetic => "synthetic fallback",
            SourceSetProvenance::Mixed => "live search with synthetic fallback",
        };
        out.push_str(&self.heading(&format!(
            "Sources ({}, {})",
            result.sources.len(),
            provenance
        )));
        out.push('\n');
        for (i, source) in result.sources.iter().enumerate() {
            let marker = match source.provenance() {
                _ if source.is_uploaded_document() => " [document]",
                Provenance::Live => "",
                Provenance::Synthetic => " [synthetic]",
            };
            out.push_str(&format!(
                "  [{}] {} ({:.2}){}\n",
                i + 1,
                source.title(),
                source.credibility(),
                marker
            ));
        }
        out.push('\n');

        out.push_str(&self.heading("Citations"));
        out.push('\n');
        for citation in report.citations() {
            out.push_str(&format!("  {}\n", citation));
        }

        out
    }
}
