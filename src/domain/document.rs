//! Uploaded documents analysed alongside web research

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Extracted text shorter than this is treated as a failed extraction
pub const MIN_DOCUMENT_CHARS: usize = 10;

/// Longest excerpt of a document handed to the synthesizer
pub const DOCUMENT_EXCERPT_CHARS: usize = 4000;

pub const DEFAULT_DOCUMENT_TASK: &str = "Summarize this document and extract key insights";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Kind from the file extension, case-insensitive
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if name.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
        }
    }
}

/// Text extracted from an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    name: String,
    kind: DocumentKind,
    text: String,
    uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        kind: DocumentKind,
        text: impl AsRef<str>,
    ) -> Result<Self, DomainError> {
        let text = normalize(text.as_ref());
        if text.chars().count() < MIN_DOCUMENT_CHARS {
            return Err(DomainError::validation(
                "Failed to extract meaningful text from document; the file may be empty or scanned",
            ));
        }

        let name = match name.into().trim() {
            "" => format!("document.{}", kind),
            name => name.to_string(),
        };

        Ok(Self {
            name,
            kind,
            text,
            uploaded_at: Utc::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// At most `max_chars` leading characters
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

/// Trim trailing spaces per line and collapse runs of blank lines
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(DocumentKind::from_file_name("Report.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("notes.docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_name("legacy.doc"), None);
        assert_eq!(DocumentKind::from_file_name("data.csv"), None);
    }

    #[test]
    fn test_short_text_is_rejected() {
        let result = Document::new("a.pdf", DocumentKind::Pdf, "  \n tiny \n");
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_text_is_normalized() {
        let doc = Document::new(
            "a.docx",
            DocumentKind::Docx,
            "Title   \n\n\n\nFirst paragraph.\n\nSecond.  ",
        )
        .unwrap();

        assert_eq!(doc.text(), "Title\n\nFirst paragraph.\n\nSecond.");
    }

    #[test]
    fn test_blank_name_gets_default() {
        let doc = Document::new(" ", DocumentKind::Pdf, "Enough text to keep").unwrap();
        assert_eq!(doc.name(), "document.pdf");
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let doc = Document::new("a.pdf", DocumentKind::Pdf, "ééééééééééé").unwrap();

        assert_eq!(doc.excerpt(3), "ééé");
        assert_eq!(doc.excerpt(100), doc.text());
    }
}
