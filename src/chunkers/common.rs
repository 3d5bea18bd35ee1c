//! Helpers shared by every [`super::FormatChunker`]: header assembly, token
//! counting, and the oversized-paragraph splitting policy used identically
//! by Markdown, HTML, DOCX, and the PDF paragraph pass (spec §4.6
//! "Splitting policy").

use super::ChunkerContext;
use crate::id::ChunkId;
use crate::model::{ChunkHeader, ChunkMetadata, QualityMetrics};

/// Allocate the next id/sequence pair and assemble a [`ChunkHeader`] from
/// it, the caller's `specific_type` tag, and `metadata`.
pub fn next_header(
    ctx: &mut ChunkerContext<'_>,
    specific_type: impl Into<String>,
    metadata: ChunkMetadata,
) -> ChunkHeader {
    let (id, sequence) = ctx.ids.next_with_sequence();
    ChunkHeader::new(id, sequence, specific_type, metadata)
}

/// Compute [`QualityMetrics`] for an intact (unsplit) unit of `text`.
pub fn quality_for(ctx: &ChunkerContext<'_>, text: &str) -> QualityMetrics {
    QualityMetrics::for_text(text, ctx.counter.count(text))
}

/// One piece of a paragraph that may have been split to respect
/// `options.max_tokens` (spec §4.6 splitting policy): its text and the
/// `SemanticCompleteness` to record for it.
pub struct TextFragment {
    pub text: String,
    pub completeness: f32,
}

/// Split `text` into one or more [`TextFragment`]s so that every fragment's
/// token count is at most `options.max_tokens`. A single fragment with
/// completeness `1.0` is returned when splitting isn't needed.
///
/// Token-counter failures degrade to an `EncoderUnavailable` warning and an
/// unsplit single fragment rather than propagating (spec §4.1 "Failure
/// modes" extended to this call site: never raise to the caller).
pub fn split_into_fragments(ctx: &mut ChunkerContext<'_>, text: &str) -> Vec<TextFragment> {
    if text.is_empty() {
        return vec![TextFragment {
            text: String::new(),
            completeness: 1.0,
        }];
    }
    if ctx.counter.count(text) <= ctx.options.max_tokens {
        return vec![TextFragment {
            text: text.to_string(),
            completeness: 1.0,
        }];
    }

    match ctx
        .counter
        .split_batches(text, ctx.options.max_tokens, ctx.options.overlap_tokens)
    {
        Ok(batches) if !batches.is_empty() => {
            let last = batches.len() - 1;
            batches
                .into_iter()
                .enumerate()
                .map(|(i, batch)| TextFragment {
                    text: batch,
                    completeness: if i == last { 1.0 } else { 0.7 },
                })
                .collect()
        }
        Ok(_) => vec![TextFragment {
            text: text.to_string(),
            completeness: 1.0,
        }],
        Err(err) => {
            ctx.warnings
                .push(crate::result::ChunkingWarning::warning(format!(
                    "falling back to an unsplit fragment after split_batches failed: {err}"
                )));
            vec![TextFragment {
                text: text.to_string(),
                completeness: 1.0,
            }]
        }
    }
}

/// `true` for lines consisting only of whitespace, used by the PlainText,
/// Markdown list/code detection, and PDF paragraph splitting passes alike.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Normalize `\r\n` and bare `\r` line endings to `\n` (spec §4.8 "Operates
/// on normalized line endings").
pub fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// A stack of currently-open Section ids by heading level, used by every
/// hierarchical-heading chunker (Markdown, HTML, PlainText, DOCX) to
/// determine a new chunk's parent (spec §4.6 "nearest preceding Section
/// with smaller HeadingLevel").
#[derive(Default)]
pub struct SectionStack {
    /// `(heading_level, chunk_id)`, strictly increasing `heading_level`
    /// from bottom to top of the stack.
    open: Vec<(u8, ChunkId)>,
}

impl SectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id that should parent non-heading content right now: the
    /// innermost open section, or `None` at the document root.
    pub fn current_parent(&self) -> Option<ChunkId> {
        self.open.last().map(|&(_, id)| id)
    }

    /// Push a new heading at `level`, popping any open sections at the same
    /// or a deeper level first, and return its resolved parent.
    pub fn push(&mut self, level: u8, id: ChunkId) -> Option<ChunkId> {
        while matches!(self.open.last(), Some(&(open_level, _)) if open_level >= level) {
            self.open.pop();
        }
        let parent = self.current_parent();
        self.open.push((level, id));
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_stack_parents_shallower_heading() {
        let mut stack = SectionStack::new();
        let h1 = ChunkId::new_random();
        let h3 = ChunkId::new_random();
        assert_eq!(stack.push(1, h1), None);
        // h1 -> h3 leaves h3 parented by h1 (spec §4.6).
        assert_eq!(stack.push(3, h3), Some(h1));
        assert_eq!(stack.current_parent(), Some(h3));
    }

    #[test]
    fn section_stack_pops_same_or_deeper_levels() {
        let mut stack = SectionStack::new();
        let h1 = ChunkId::new_random();
        let h2a = ChunkId::new_random();
        let h2b = ChunkId::new_random();
        stack.push(1, h1);
        stack.push(2, h2a);
        let parent = stack.push(2, h2b);
        assert_eq!(parent, Some(h1));
    }
}
