//! PPTX text extraction
//!
//! PPTX files are ZIP archives; each slide lives in `ppt/slides/slideN.xml`.
//! Slides are read in numeric order and every DrawingML text run (`<a:t>`)
//! is collected, one line per paragraph.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::DocumentKind;
use crate::error::ExtractionError;

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

fn unreadable(message: impl ToString) -> ExtractionError {
    ExtractionError::Unreadable {
        format: DocumentKind::Pptx.label().to_string(),
        message: message.to_string(),
    }
}

/// Numeric index of a slide part, e.g. `ppt/slides/slide12.xml` -> 12
pub(crate) fn slide_index(part_name: &str) -> Option<u32> {
    let digits = part_name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(SLIDE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns the labelled text of all slides and the number of slide parts found
pub(crate) fn extract_slides(bytes: &[u8]) -> Result<(String, usize), ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(unreadable)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_index(name).map(|index| (index, name.to_string())))
        .collect();
    slides.sort_by_key(|(index, _)| *index);

    tracing::debug!(slides = slides.len(), "[DocumentParser] PPTX slide parts found");

    let mut sections = Vec::new();
    for (index, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(unreadable)?
            .read_to_string(&mut xml)
            .map_err(unreadable)?;

        let text = slide_text(&xml)?;
        if !text.is_empty() {
            sections.push(format!("--- Slide {} ---\n{}", index, text));
        }
    }

    if sections.is_empty() {
        return Err(ExtractionError::Empty {
            format: DocumentKind::Pptx.label().to_string(),
            reason: format!("no text found across {} slides", slides.len()),
        });
    }

    Ok((sections.join("\n\n"), slides.len()))
}

/// Text runs of one slide; a closing `</a:p>` ends a line
fn slide_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let line = current.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"br" => current.push(' '),
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(unreadable)?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_text => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(unreadable(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        lines.push(tail.to_string());
    }

    Ok(lines.join("\n"))
}
