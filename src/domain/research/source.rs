//! Sources admitted by the retrieval stage

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::document::{DOCUMENT_EXCERPT_CHARS, Document};
use crate::domain::search::RawSearchResult;
use crate::domain::DomainError;

/// Publisher shown for uploaded documents
pub const UPLOADED_DOCUMENT_DOMAIN: &str = "Uploaded Document";

/// Where a source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Returned by the live search provider
    Live,
    /// Produced by the deterministic fallback
    Synthetic,
}

/// Aggregate provenance of a source set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSetProvenance {
    Live,
    Synthetic,
    Mixed,
}

/// A credibility-scored source. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    title: String,
    url: String,
    snippet: String,
    domain: String,
    credibility: f32,
    provenance: Provenance,
    retrieved_at: DateTime<Utc>,
}

impl Source {
    /// Admit a raw search result; the url must be an absolute http(s) url
    pub fn admit(
        result: &RawSearchResult,
        credibility: f32,
        provenance: Provenance,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let domain = domain_of(&result.url).ok_or_else(|| {
            DomainError::validation(format!("Malformed source url: {}", result.url))
        })?;

        let title = match result.title.trim() {
            "" => "Untitled".to_string(),
            title => title.to_string(),
        };

        Ok(Self {
            title,
            url: result.url.trim().to_string(),
            snippet: result.snippet.trim().to_string(),
            domain,
            credibility: if credibility.is_finite() {
                credibility.clamp(0.0, 1.0)
            } else {
                0.0
            },
            provenance,
            retrieved_at,
        })
    }

    /// An uploaded document as a fully trusted source. It was not returned
    /// by live search, so it is flagged synthetic.
    pub fn from_document(document: &Document) -> Self {
        Self {
            title: document.name().to_string(),
            url: format!("uploaded://{}", document.name().replace(' ', "%20")),
            snippet: document.excerpt(DOCUMENT_EXCERPT_CHARS).to_string(),
            domain: UPLOADED_DOCUMENT_DOMAIN.to_string(),
            credibility: 1.0,
            provenance: Provenance::Synthetic,
            retrieved_at: document.uploaded_at(),
        }
    }

    pub fn is_uploaded_document(&self) -> bool {
        self.url.starts_with("uploaded://")
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Host without a leading `www.`
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn credibility(&self) -> f32 {
        self.credibility
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }
}

/// Extract the host of an absolute http(s) url, without `www.`
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() { None } else { Some(host) }
}

/// Ordered, url-deduplicated sources with non-increasing credibility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet(Vec<Source>);

impl SourceSet {
    /// Build a set from candidates in retrieval order.
    ///
    /// The first occurrence of a url wins, ordering is by descending
    /// credibility with ties kept in retrieval order, and the result is
    /// truncated to `limit`.
    pub fn from_candidates(candidates: Vec<Source>, limit: usize) -> Self {
        let mut seen = HashSet::new();
        let mut sources: Vec<Source> = candidates
            .into_iter()
            .filter(|s| seen.insert(s.url.clone()))
            .collect();

        // sort_by is stable
        sources.sort_by(|a, b| {
            b.credibility
                .partial_cmp(&a.credibility)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sources.truncate(limit);

        Self(sources)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Source] {
        &self.0
    }

    pub fn urls(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.url()).collect()
    }

    pub fn synthetic_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_synthetic()).count()
    }

    pub fn is_all_synthetic(&self) -> bool {
        !self.0.is_empty() && self.synthetic_count() == self.0.len()
    }

    /// Aggregate provenance. An empty set reports `Live`.
    pub fn provenance(&self) -> SourceSetProvenance {
        match self.synthetic_count() {
            0 => SourceSetProvenance::Live,
            n if n == self.0.len() => SourceSetProvenance::Synthetic,
            _ => SourceSetProvenance::Mixed,
        }
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
