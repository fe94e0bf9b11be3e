//! Document Parser Module
//!
//! Pure Rust text extraction from uploaded bytes - no external tools required.
//!
//! ## Supported Formats
//! - PDF: page-by-page text via pdf-extract
//! - Word: .docx via docx-rs
//! - PowerPoint: .pptx via zip + quick-xml (see `pptx`)
//! - Text: .txt (direct decode)
//!
//! Every format fails with `ExtractionError::Empty` when nothing but
//! whitespace comes out, e.g. scanned/image-only PDFs.

use super::pptx;
use super::{DocumentKind, ExtractedDocument, Upload, ACCEPTED_FORMATS};
use crate::error::ExtractionError;

/// Reject uploads over the configured byte threshold before parsing
pub fn ensure_within_limit(size: usize, limit: usize) -> Result<(), ExtractionError> {
    if size > limit {
        return Err(ExtractionError::TooLarge { size: Some(size), limit });
    }
    Ok(())
}

/// Document parser using pure Rust crates
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text from an upload, dispatching on its detected format
    pub fn parse(&self, upload: &Upload) -> Result<ExtractedDocument, ExtractionError> {
        let kind = DocumentKind::detect(upload).ok_or_else(|| {
            let extension = upload.extension().unwrap_or_else(|| "(none)".to_string());
            tracing::warn!(
                file = %upload.file_name,
                extension = %extension,
                content_type = ?upload.content_type,
                "[DocumentParser] Rejected unsupported upload"
            );
            ExtractionError::Unsupported {
                extension,
                accepted: ACCEPTED_FORMATS.to_string(),
            }
        })?;

        tracing::info!(
            file = %upload.file_name,
            kind = ?kind,
            bytes = upload.bytes.len(),
            "[DocumentParser] Starting extraction"
        );

        let (text, page_count) = match kind {
            DocumentKind::Pdf => Self::extract_pdf(&upload.bytes)?,
            DocumentKind::Docx => (Self::extract_docx(&upload.bytes)?, None),
            DocumentKind::Pptx => {
                let (text, slides) = pptx::extract_slides(&upload.bytes)?;
                (text, Some(slides))
            }
            DocumentKind::Txt => (Self::read_plain_text(&upload.bytes)?, None),
        };

        let word_count = text.split_whitespace().count();

        tracing::info!(
            file = %upload.file_name,
            chars = text.chars().count(),
            words = word_count,
            pages = ?page_count,
            "[DocumentParser] Extraction succeeded"
        );

        if !text.is_empty() {
            let preview: String = text.chars().take(200).collect();
            tracing::debug!("[DocumentParser] Content preview: {}...", preview);
        }

        Ok(ExtractedDocument {
            text,
            kind,
            word_count,
            page_count,
        })
    }

    /// Decode a text file, dropping a UTF-8 byte order mark
    fn read_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_string();

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty {
                format: DocumentKind::Txt.label().to_string(),
                reason: "the file contains no text".to_string(),
            });
        }

        Ok(text)
    }

    /// Extract text from PDF using pdf-extract
    /// Wrapped in catch_unwind to handle panics from malformed PDFs
    fn extract_pdf(bytes: &[u8]) -> Result<(String, Option<usize>), ExtractionError> {
        let format = DocumentKind::Pdf.label().to_string();

        // The pdf_extract crate (and its cff-parser dependency) can panic on certain fonts/glyphs
        let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                tracing::warn!("[DocumentParser] PDF extraction FAILED: {}", e);
                return Err(ExtractionError::Unreadable {
                    format,
                    message: e.to_string(),
                });
            }
            Err(_panic) => {
                tracing::error!("[DocumentParser] PDF extraction PANICKED - likely malformed font/glyph");
                return Err(ExtractionError::Unreadable {
                    format,
                    message: "the PDF parser crashed, it likely contains malformed fonts".to_string(),
                });
            }
        };

        let page_count = pages.len();
        let text = Self::join_pdf_pages(&pages);

        if text.trim().is_empty() {
            tracing::warn!(pages = page_count, "[DocumentParser] PDF has no text layer");
            return Err(ExtractionError::Empty {
                format,
                reason: "no text could be extracted, it might be scanned images. Text-based PDFs work best"
                    .to_string(),
            });
        }

        Ok((text, Some(page_count)))
    }

    /// Each page's text items joined by single spaces, pages separated by newlines
    fn join_pdf_pages(pages: &[String]) -> String {
        pages
            .iter()
            .map(|page| page.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Extract text from DOCX using docx-rs
    fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
        let format = DocumentKind::Docx.label().to_string();

        let doc = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::Unreadable {
            format: format.clone(),
            message: e.to_string(),
        })?;

        let mut all_text = String::new();
        for child in &doc.document.children {
            Self::extract_docx_content(child, &mut all_text);
        }

        let text = Self::clean_text(&all_text);
        if text.is_empty() {
            return Err(ExtractionError::Empty {
                format,
                reason: "the document body has no text".to_string(),
            });
        }

        Ok(text)
    }

    fn push_run_text(run: &docx_rs::Run, output: &mut String) {
        for run_child in &run.children {
            match run_child {
                docx_rs::RunChild::Text(text) => output.push_str(&text.text),
                docx_rs::RunChild::Tab(_) => output.push('\t'),
                docx_rs::RunChild::Break(_) => output.push('\n'),
                _ => {}
            }
        }
    }

    fn push_paragraph_text(para: &docx_rs::Paragraph, output: &mut String) {
        for child in &para.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => Self::push_run_text(run, output),
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    for link_child in &link.children {
                        if let docx_rs::ParagraphChild::Run(run) = link_child {
                            Self::push_run_text(run, output);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Walk DOCX body elements: paragraphs become lines, table rows become `a | b` lines
    fn extract_docx_content(element: &docx_rs::DocumentChild, output: &mut String) {
        match element {
            docx_rs::DocumentChild::Paragraph(para) => {
                Self::push_paragraph_text(para, output);
                output.push('\n');
            }
            docx_rs::DocumentChild::Table(table) => {
                for row in &table.rows {
                    let docx_rs::TableChild::TableRow(tr) = row;
                    let mut cells = Vec::new();
                    for cell in &tr.cells {
                        let docx_rs::TableRowChild::TableCell(tc) = cell;
                        let mut cell_text = String::new();
                        for child in &tc.children {
                            if let docx_rs::TableCellContent::Paragraph(para) = child {
                                Self::push_paragraph_text(para, &mut cell_text);
                                cell_text.push(' ');
                            }
                        }
                        let cell_text = cell_text.trim().to_string();
                        if !cell_text.is_empty() {
                            cells.push(cell_text);
                        }
                    }
                    if !cells.is_empty() {
                        output.push_str(&cells.join(" | "));
                        output.push('\n');
                    }
                }
            }
            _ => {}
        }
    }

    /// Trim lines and drop blank ones
    fn clean_text(text: &str) -> String {
        text.lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory fixture builders shared by parser and action tests

    use std::io::{Cursor, Write};

    /// Minimal single-page PDF; `content` is the raw page content stream
    pub fn pdf_with_content(content: &str) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );
        out
    }

    pub fn pdf_with_text(text: &str) -> Vec<u8> {
        pdf_with_content(&format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text))
    }

    pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = docx_rs::Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
            );
        }
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    /// PPTX-shaped archive holding only the given slide parts; one paragraph per line
    pub fn pptx_with_slides(slides: &[(u32, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();

        for (index, paragraphs) in slides {
            let body: String = paragraphs
                .lines()
                .map(|run| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", run))
                .collect();
            let xml = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
                 xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
                 <p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
                body
            );
            zip.start_file(format!("ppt/slides/slide{}.xml", index), options)
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}
