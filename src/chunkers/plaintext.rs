//! Plain Text Chunker (spec §4.8): heuristic structure recovery over
//! normalized, unstructured text — no markup to rely on.

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker, SectionStack};
use crate::error::ChunkingError;
use crate::model::{
    Chunk, ChunkBody, ChunkMetadata, CodeBlockChunk, DocumentType, HeadingType, ListItemChunk,
    ParagraphChunk, QualityMetrics, SectionChunk,
};

#[derive(Default)]
pub struct PlainTextChunker;

impl FormatChunker for PlainTextChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::PlainText
    }

    fn can_handle(&self, _peek: &[u8]) -> bool {
        // Catch-all: the registry tries every other chunker first.
        true
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let text = super::normalize_line_endings(&String::from_utf8_lossy(bytes));
        let lines: Vec<&str> = text.lines().collect();
        let mut chunks = Vec::new();
        let mut sections = SectionStack::new();

        let mut i = 0;
        let mut paragraph_buf: Vec<&str> = Vec::new();
        let mut code_buf: Vec<&str> = Vec::new();
        let mut in_fence = false;
        let mut fence_lang: Option<String> = None;

        macro_rules! flush_paragraph {
            () => {
                if !paragraph_buf.is_empty() {
                    emit_paragraph(ctx, &mut chunks, sections.current_parent(), &paragraph_buf.join("\n"));
                    paragraph_buf.clear();
                }
            };
        }

        while i < lines.len() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            let line = lines[i];

            if in_fence {
                if line.trim_start().starts_with("```") {
                    in_fence = false;
                    emit_code_block(ctx, &mut chunks, sections.current_parent(), &code_buf.join("\n"), fence_lang.take(), true);
                    code_buf.clear();
                } else {
                    code_buf.push(line);
                }
                i += 1;
                continue;
            }

            if line.trim_start().starts_with("```") {
                flush_paragraph!();
                in_fence = true;
                let info = line.trim_start().trim_start_matches("```").trim();
                fence_lang = if info.is_empty() { None } else { Some(info.to_string()) };
                i += 1;
                continue;
            }

            if super::is_blank(line) {
                flush_paragraph!();
                i += 1;
                continue;
            }

            if let Some(level) = indent_level(line) {
                if level >= 4 {
                    flush_paragraph!();
                    let mut block = vec![dedent(line, 4)];
                    let mut j = i + 1;
                    while j < lines.len() && (super::is_blank(lines[j]) || indent_level(lines[j]).unwrap_or(0) >= 4) {
                        if super::is_blank(lines[j]) {
                            block.push(String::new());
                        } else {
                            block.push(dedent(lines[j], 4));
                        }
                        j += 1;
                    }
                    while matches!(block.last(), Some(s) if s.is_empty()) {
                        block.pop();
                    }
                    emit_code_block(ctx, &mut chunks, sections.current_parent(), &block.join("\n"), None, false);
                    i = j;
                    continue;
                }
            }

            if let Some((level, kind)) = detect_heading(&lines, i) {
                flush_paragraph!();
                let consumed = if kind == HeadingType::Underlined { 2 } else { 1 };
                let text = heading_text(lines[i], kind);
                let metadata = ChunkMetadata::new(DocumentType::PlainText, text.clone());
                let mut header = next_header(ctx, "Heading", metadata);
                let parent = sections.push(level, header.id);
                if let Some(p) = parent {
                    header = header.with_parent(p);
                }
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::Section(SectionChunk {
                        heading_level: Some(level),
                        heading_text: text,
                        heading_type: Some(kind),
                        ..Default::default()
                    }),
                ));
                i += consumed;
                continue;
            }

            if let Some((marker_len, is_ordered)) = detect_list_item(line) {
                flush_paragraph!();
                let content = line.trim_start()[marker_len..].trim_start().to_string();
                let metadata = ChunkMetadata::new(DocumentType::PlainText, "list item");
                let mut header = next_header(ctx, "ListItem", metadata);
                if let Some(p) = sections.current_parent() {
                    header = header.with_parent(p);
                }
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::ListItem(ListItemChunk {
                        content,
                        is_ordered,
                        list_level: 0,
                        ..Default::default()
                    }),
                ));
                i += 1;
                continue;
            }

            paragraph_buf.push(line);
            i += 1;
        }
        flush_paragraph!();
        if in_fence && !code_buf.is_empty() {
            emit_code_block(ctx, &mut chunks, sections.current_parent(), &code_buf.join("\n"), fence_lang, true);
        }

        Ok(chunks)
    }
}

fn indent_level(line: &str) -> Option<usize> {
    Some(line.chars().take_while(|c| *c == ' ').count())
}

fn dedent(line: &str, n: usize) -> String {
    line.chars().skip(n).collect()
}

/// `true` if `line` is at least 70% uppercase alphabetic among its letters,
/// the all-caps heading heuristic (spec §4.8).
fn is_all_caps_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 3 || trimmed.len() > 80 {
        return false;
    }
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 3 {
        return false;
    }
    letters.iter().all(|c| c.is_uppercase())
}

fn numbered_heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim_start();
    let end = trimmed.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    let prefix = &trimmed[..end];
    if prefix.is_empty() || !prefix.chars().next()?.is_ascii_digit() {
        return None;
    }
    let rest = trimmed[end..].trim_start();
    if rest.is_empty() || rest.chars().next()?.is_whitespace() {
        return None;
    }
    let depth = prefix.trim_end_matches('.').split('.').count();
    Some(depth.min(6) as u8)
}

fn prefixed_heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    if trimmed[hashes..].starts_with(' ') {
        Some(hashes as u8)
    } else {
        None
    }
}

fn detect_heading(lines: &[&str], i: usize) -> Option<(u8, HeadingType)> {
    let line = lines[i];
    if super::is_blank(line) {
        return None;
    }
    if let Some(next) = lines.get(i + 1) {
        let next_trim = next.trim();
        if !next_trim.is_empty() && next_trim.chars().all(|c| c == '=') {
            return Some((1, HeadingType::Underlined));
        }
        if !next_trim.is_empty() && next_trim.chars().all(|c| c == '-') && next_trim.len() >= 3 {
            return Some((2, HeadingType::Underlined));
        }
    }
    if let Some(level) = prefixed_heading_level(line) {
        return Some((level, HeadingType::Prefixed));
    }
    if let Some(level) = numbered_heading_level(line) {
        return Some((level, HeadingType::Numbered));
    }
    if is_all_caps_heading(line) {
        return Some((1, HeadingType::AllCaps));
    }
    None
}

fn heading_text(line: &str, kind: HeadingType) -> String {
    match kind {
        HeadingType::Prefixed => line.trim_start().trim_start_matches('#').trim().to_string(),
        _ => line.trim().to_string(),
    }
}

fn detect_list_item(line: &str) -> Option<(usize, bool)> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("+ "))) {
        let _ = rest;
        return Some((1, false));
    }
    let end = trimmed.find(|c: char| !c.is_ascii_digit())?;
    if end == 0 {
        return None;
    }
    let after = &trimmed[end..];
    if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
        let _ = rest;
        return Some((end + 2, true));
    }
    None
}

fn emit_paragraph(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: Option<crate::id::ChunkId>, text: &str) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    for fragment in split_into_fragments(ctx, trimmed) {
        let metadata = ChunkMetadata::new(DocumentType::PlainText, "paragraph");
        let mut header = next_header(ctx, "Paragraph", metadata);
        if let Some(p) = parent {
            header = header.with_parent(p);
        }
        let quality = quality_for(ctx, &fragment.text);
        chunks.push(Chunk::new(
            header.with_quality_metrics(QualityMetrics {
                semantic_completeness: fragment.completeness,
                ..quality
            }),
            ChunkBody::Paragraph(ParagraphChunk {
                content: fragment.text,
                ..Default::default()
            }),
        ));
    }
}

fn emit_code_block(
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    parent: Option<crate::id::ChunkId>,
    content: &str,
    language: Option<String>,
    is_fenced: bool,
) {
    if content.is_empty() {
        return;
    }
    let metadata = ChunkMetadata::new(DocumentType::PlainText, "code block");
    let mut header = next_header(ctx, "CodeBlock", metadata);
    if let Some(p) = parent {
        header = header.with_parent(p);
    }
    chunks.push(Chunk::new(
        header,
        ChunkBody::CodeBlock(CodeBlockChunk {
            content: content.to_string(),
            language,
            is_fenced,
            is_monospace: true,
            ..Default::default()
        }),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::id::IdGenerator;
    use crate::options::ChunkingOptions;
    use crate::result::ChunkingWarning;
    use crate::tokenizer::build_counter_or_fallback;
    use crate::tokenizer::Encoding;

    fn run(text: &str) -> Vec<Chunk> {
        let options = ChunkingOptions::default();
        let (counter, _) = build_counter_or_fallback(Encoding::CharacterBased);
        let mut ids = IdGenerator::random();
        let cancel = CancellationToken::new();
        let mut warnings = Vec::<ChunkingWarning>::new();
        let mut ctx = ChunkerContext {
            options: &options,
            counter: counter.as_ref(),
            ids: &mut ids,
            cancel: &cancel,
            warnings: &mut warnings,
        };
        PlainTextChunker.chunk(text.as_bytes(), &mut ctx).unwrap()
    }

    #[test]
    fn underlined_heading_is_detected() {
        let chunks = run("Title\n=====\n\nBody text here.\n");
        assert!(chunks.iter().any(|c| matches!(&c.body, ChunkBody::Section(s) if s.heading_text == "Title")));
    }

    #[test]
    fn all_caps_line_is_a_heading() {
        let chunks = run("INTRODUCTION\n\nSome body text.\n");
        assert!(chunks
            .iter()
            .any(|c| matches!(&c.body, ChunkBody::Section(s) if s.heading_type == Some(HeadingType::AllCaps))));
    }

    #[test]
    fn dash_bullets_become_list_items() {
        let chunks = run("- first\n- second\n");
        let items: Vec<_> = chunks
            .iter()
            .filter(|c| matches!(c.body, ChunkBody::ListItem(_)))
            .collect();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn indented_block_becomes_code() {
        let chunks = run("Para one.\n\n    let x = 1;\n    let y = 2;\n\nPara two.\n");
        assert!(chunks.iter().any(|c| matches!(&c.body, ChunkBody::CodeBlock(cb) if cb.content.contains("let x = 1;"))));
    }
}
