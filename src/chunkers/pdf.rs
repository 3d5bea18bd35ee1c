//! PDF Chunker (spec §4.13): `pdf-extract` gives per-page plain text; this
//! chunker reconstructs document/page structure and paragraph boundaries
//! around that. Page geometry (`Width`/`Height`/`Rotation`) and the
//! title/author/subject/date metadata fields aren't exposed by
//! `pdf-extract`'s text-only API, so they're left unset — see DESIGN.md.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker};
use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::{
    Chunk, ChunkBody, ChunkMetadata, DocumentType, ParagraphChunk, PdfDocumentChunk, PdfPageChunk,
    QualityMetrics,
};

#[derive(Default)]
pub struct PdfChunker;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%PDF-(\d\.\d)").unwrap());

impl FormatChunker for PdfChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pdf
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        peek.starts_with(b"%PDF-")
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ChunkingError::MalformedInput(format!("failed to extract PDF text: {e}")))?;

        let header_slice = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
        let version = VERSION_RE.captures(&header_slice).map(|c| c[1].to_string());
        let encrypted = contains(bytes, b"/Encrypt");

        let metadata = ChunkMetadata::new(DocumentType::Pdf, "document");
        let doc_header = next_header(ctx, "PdfDocument", metadata);
        let doc_id = doc_header.id;
        let mut chunks = vec![Chunk::new(
            doc_header,
            ChunkBody::PdfDocument(PdfDocumentChunk {
                version,
                page_count: pages.len(),
                encrypted,
                ..Default::default()
            }),
        )];

        for (i, text) in pages.into_iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            let page_number = (i + 1) as u32;
            let word_count = text.split_whitespace().count();
            let metadata = ChunkMetadata::new(DocumentType::Pdf, format!("page {page_number}"))
                .with_page_number(page_number);
            let page_header = next_header(ctx, "Page", metadata).with_parent(doc_id);
            let page_id = page_header.id;
            chunks.push(Chunk::new(
                page_header,
                ChunkBody::PdfPage(PdfPageChunk {
                    page_number,
                    width: 0.0,
                    height: 0.0,
                    rotation: None,
                    text: text.clone(),
                    word_count,
                    ..Default::default()
                }),
            ));

            for (paragraph_index, paragraph) in text.split("\n\n").enumerate() {
                if ctx.is_cancelled() {
                    return Err(ChunkingError::Cancelled);
                }
                emit_paragraph(ctx, &mut chunks, page_id, page_number, paragraph_index as u32, paragraph);
            }
        }

        Ok(chunks)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// `true` for a short, unterminated, disproportionately uppercase line —
/// the PDF paragraph-heading heuristic (spec §4.13 `IsLikelyHeading`).
fn is_likely_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 100 {
        return false;
    }
    if trimmed.ends_with('.') || trimmed.ends_with(',') {
        return false;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("chapter ") || lowered.starts_with("section ") {
        return true;
    }
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 > 0.30
}

fn emit_paragraph(
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    page_id: ChunkId,
    page_number: u32,
    paragraph_index: u32,
    text: &str,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    let is_heading = is_likely_heading(trimmed);
    for fragment in split_into_fragments(ctx, trimmed) {
        let metadata = ChunkMetadata::new(DocumentType::Pdf, "paragraph").with_page_number(page_number);
        let header = next_header(ctx, "Paragraph", metadata).with_parent(page_id);
        let quality = quality_for(ctx, &fragment.text);
        chunks.push(Chunk::new(
            header.with_quality_metrics(QualityMetrics {
                semantic_completeness: fragment.completeness,
                ..quality
            }),
            ChunkBody::Paragraph(ParagraphChunk {
                content: fragment.text,
                page_number: Some(page_number),
                paragraph_index: Some(paragraph_index),
                is_likely_heading: Some(is_heading),
                ..Default::default()
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_all_caps_no_period_line_is_a_heading() {
        assert!(is_likely_heading("INTRODUCTION"));
    }

    #[test]
    fn chapter_prefixed_line_is_a_heading() {
        assert!(is_likely_heading("Chapter 3: Results"));
    }

    #[test]
    fn chapter_prefix_match_is_case_insensitive() {
        assert!(is_likely_heading("chapter 3: results"));
        assert!(is_likely_heading("SECTION 2 overview"));
    }

    #[test]
    fn long_sentence_ending_in_period_is_not_a_heading() {
        assert!(!is_likely_heading("This is a regular sentence that ends with a period."));
    }
}
