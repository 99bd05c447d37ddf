use crate::domain::DomainError;

pub(super) fn extract_text(bytes: &[u8]) -> Result<String, DomainError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DomainError::validation(format!("Error extracting PDF text: {}", e)))
}
