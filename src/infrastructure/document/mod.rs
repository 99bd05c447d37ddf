//! Text extraction for uploaded files
//!
//! Extraction is synchronous and CPU bound; callers on the async runtime
//! should run it on a blocking thread.

mod docx;
mod pdf;

use tracing::debug;

use crate::domain::{Document, DocumentKind, DomainError};

pub const UNSUPPORTED_FILE_MESSAGE: &str = "Unsupported file type. Upload a PDF or DOCX file.";

/// Extract the text of an uploaded file, picking the format by extension
pub fn extract_document(file_name: &str, bytes: &[u8]) -> Result<Document, DomainError> {
    let kind = DocumentKind::from_file_name(file_name)
        .ok_or_else(|| DomainError::validation(UNSUPPORTED_FILE_MESSAGE))?;

    if bytes.is_empty() {
        return Err(DomainError::validation("Uploaded file is empty"));
    }

    let text = match kind {
        DocumentKind::Pdf => pdf::extract_text(bytes)?,
        DocumentKind::Docx => docx::extract_text(bytes)?,
    };

    debug!(file = %file_name, kind = %kind, chars = text.len(), "Extracted document text");

    Document::new(file_name, kind, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = extract_document("notes.txt", b"plain text").unwrap_err();
        match err {
            DomainError::Validation { message } => assert_eq!(message, UNSUPPORTED_FILE_MESSAGE),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_file() {
        let err = extract_document("paper.pdf", b"").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_docx_upload() {
        let bytes = docx::tests::docx_bytes(&["Quantum Error Correction", "Surface codes win."]);
        let document = extract_document("QEC.docx", &bytes).unwrap();

        assert_eq!(document.kind(), DocumentKind::Docx);
        assert_eq!(document.name(), "QEC.docx");
        assert_eq!(document.text(), "Quantum Error Correction\nSurface codes win.");
    }
}
