//! Chunker Registry / Dispatcher (spec §4.5): maps a `DocumentType` or a
//! sniffed byte signature to a [`FormatChunker`].

use crate::chunkers::{
    CsvChunker, DocxChunker, FormatChunker, HtmlChunker, MarkdownChunker, PdfChunker,
    PlainTextChunker, PptxChunker, XlsxChunker,
};
use crate::error::ChunkingError;
use crate::model::DocumentType;

/// Bytes peeked from the front of a stream for content sniffing (spec §4.5
/// "peek ≤ 8 KB").
pub const SNIFF_WINDOW: usize = 8 * 1024;

/// Holds one [`FormatChunker`] per supported format, in a fixed registration
/// order that also serves as the content-sniffing tie-break order (spec
/// §4.5 "ties resolved by registration order").
///
/// Registration order: PDF, DOCX, PPTX, XLSX, HTML, Markdown, CSV, PlainText.
/// The first three groups mirror the spec's bullet order (magic-byte
/// formats, then ZIP-based formats in the order their marker parts are
/// listed); HTML is checked before Markdown per the spec's own "HTML if ...
/// Markdown if ... else PlainText" phrasing; CSV is checked last among the
/// text formats since its signal (consistent delimiter counts) can
/// otherwise collide with Markdown's table-pipe heuristic. PlainText's
/// `can_handle` always returns true, making it the catch-all.
pub struct ChunkerRegistry {
    chunkers: Vec<Box<dyn FormatChunker>>,
}

impl ChunkerRegistry {
    pub fn new() -> Self {
        Self {
            chunkers: vec![
                Box::new(PdfChunker::default()),
                Box::new(DocxChunker::default()),
                Box::new(PptxChunker::default()),
                Box::new(XlsxChunker::default()),
                Box::new(HtmlChunker::default()),
                Box::new(MarkdownChunker::default()),
                Box::new(CsvChunker::default()),
                Box::new(PlainTextChunker::default()),
            ],
        }
    }

    /// Resolve by an explicit `document_type` (spec §4.4 `chunk`'s first
    /// argument).
    pub fn resolve(&self, document_type: DocumentType) -> Option<&dyn FormatChunker> {
        self.chunkers
            .iter()
            .map(|c| c.as_ref())
            .find(|c| c.document_type() == document_type)
    }

    /// Resolve by file-name extension (spec §4.5 "by file-name hint").
    pub fn resolve_by_extension(&self, file_name: &str) -> Option<&dyn FormatChunker> {
        let ext = file_name.rsplit('.').next()?;
        let document_type = DocumentType::from_extension(ext)?;
        self.resolve(document_type)
    }

    /// Resolve by sniffing `peek` (at most [`SNIFF_WINDOW`] bytes from the
    /// front of the stream), trying each chunker's `can_handle` in
    /// registration order (spec §4.5 "by content sniffing").
    pub fn resolve_by_sniffing(&self, peek: &[u8]) -> Result<&dyn FormatChunker, ChunkingError> {
        let window = &peek[..peek.len().min(SNIFF_WINDOW)];
        self.chunkers
            .iter()
            .map(|c| c.as_ref())
            .find(|c| c.can_handle(window))
            .ok_or_else(|| ChunkingError::UnsupportedFormat("no chunker claimed the input".into()))
    }
}

impl Default for ChunkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
