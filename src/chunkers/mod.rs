//! Format Chunkers (spec §4.6–§4.13): one per supported document format,
//! each parsing its input and emitting a flat, document-ordered list of
//! typed chunks with `parent_id` set but `depth`/`ancestor_ids` left for the
//! [`crate::hierarchy`] pass.

mod common;
mod csv_chunker;
mod docx;
mod html;
mod markdown;
mod pdf;
mod plaintext;
mod pptx;
mod xlsx;

pub use csv_chunker::CsvChunker;
pub use docx::DocxChunker;
pub use html::HtmlChunker;
pub use markdown::MarkdownChunker;
pub use pdf::PdfChunker;
pub use plaintext::PlainTextChunker;
pub use pptx::PptxChunker;
pub use xlsx::XlsxChunker;

use crate::cancel::CancellationToken;
use crate::error::ChunkingError;
use crate::id::IdGenerator;
use crate::model::{Chunk, DocumentType};
use crate::options::ChunkingOptions;
use crate::result::ChunkingWarning;
use crate::tokenizer::TokenCounter;

/// Mutable, per-run state threaded through a single [`FormatChunker::chunk`]
/// call: id allocation, the active token counter, and the warning sink.
/// Shared, not owned, so the engine can inspect warnings after the call
/// returns.
pub struct ChunkerContext<'a> {
    pub options: &'a ChunkingOptions,
    pub counter: &'a dyn TokenCounter,
    pub ids: &'a mut IdGenerator,
    pub cancel: &'a CancellationToken,
    pub warnings: &'a mut Vec<ChunkingWarning>,
}

impl<'a> ChunkerContext<'a> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Parses one document format into a flat, document-ordered chunk list.
///
/// Implementations must clear any per-run state at entry (spec §5 "Chunker
/// instances are expected to be reusable") and must not seek the input
/// backward except during `can_handle` (spec §5 "Streams").
pub trait FormatChunker: Send + Sync {
    fn document_type(&self) -> DocumentType;

    /// `true` if this chunker's format is detected in `peek` (spec §4.5).
    /// Must not consume or require more than `peek`.
    fn can_handle(&self, peek: &[u8]) -> bool;

    /// Parse `bytes` (the whole materialized input) and emit chunks in
    /// document order. `parent_id` must be set on every non-root chunk;
    /// `depth`/`ancestor_ids`/`sequence_number` are the Hierarchy Builder's
    /// and the caller's responsibility respectively — this trait assigns
    /// `sequence_number` via `ctx.ids`' paired sequence counter (see
    /// `common::next_header`).
    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError>;
}

pub(crate) use common::*;
