//! Document text extraction
//!
//! Turns an uploaded PDF, DOCX, PPTX or TXT file into plain text for the
//! prompt builder. Format is chosen by file extension, with a `text/plain`
//! MIME fallback for files whose extension is missing or unknown.

pub mod document_parser;
mod pptx;

pub use document_parser::{ensure_within_limit, DocumentParser};

use serde::Serialize;

/// Human-readable list used in "unsupported" errors
pub const ACCEPTED_FORMATS: &str = "PDF, Word (DOCX), PowerPoint (PPTX), or Text (TXT)";

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension after the last dot, if any
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(&self.file_name);
        name.rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Pptx,
    Txt,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Pick a format from extension first, then a plain-text MIME type
    pub fn detect(upload: &Upload) -> Option<Self> {
        upload
            .extension()
            .and_then(|ext| Self::from_extension(&ext))
            .or_else(|| {
                upload
                    .content_type
                    .as_deref()
                    .filter(|mime| is_plain_text_mime(mime))
                    .map(|_| Self::Txt)
            })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word",
            Self::Pptx => "PowerPoint",
            Self::Txt => "text",
        }
    }
}

fn is_plain_text_mime(mime: &str) -> bool {
    mime.split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false)
}

/// Result of extracting an upload
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub kind: DocumentKind,
    pub word_count: usize,
    /// Pages for PDF, slides for PPTX
    pub page_count: Option<usize>,
}
