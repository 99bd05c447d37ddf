//! DOCX text: the paragraphs of `word/document.xml`

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::domain::DomainError;

const BODY_PART: &str = "word/document.xml";

pub(super) fn extract_text(bytes: &[u8]) -> Result<String, DomainError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| invalid(format!("not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(BODY_PART)
        .map_err(|e| invalid(format!("missing {}: {}", BODY_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| invalid(e.to_string()))?;

    paragraphs(&xml)
}

/// One line per `w:p`, with `w:tab` and `w:br` kept as whitespace
fn paragraphs(xml: &str) -> Result<String, DomainError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Ok(Event::Text(e)) if in_run_text => {
                let value = e.unescape().map_err(|e| invalid(e.to_string()))?;
                text.push_str(&value);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(invalid(e.to_string())),
        }
    }

    Ok(text)
}

fn invalid(reason: String) -> DomainError {
    DomainError::validation(format!("Error extracting DOCX text: {}", reason))
}
