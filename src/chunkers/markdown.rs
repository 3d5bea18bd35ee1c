//! Markdown Chunker (spec §4.6): CommonMark/GFM via `pulldown-cmark`.

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker, SectionStack};
use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::{
    serialize_markdown_table, Chunk, ChunkBody, ChunkMetadata, CodeBlockChunk, DocumentType,
    ImageChunk, ListItemChunk, ParagraphChunk, QuoteChunk, SectionChunk, SerializationFormat,
    TableChunk, TableInfo,
};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

#[derive(Default)]
pub struct MarkdownChunker;

struct OpenList {
    /// The enclosing ListItem (nested list) or Section (top-level list)
    /// every item of this list parents to (spec §4.6 "nesting depth
    /// represented via parent linkage to the enclosing ListItem").
    parent_id: Option<ChunkId>,
    is_ordered: bool,
    next_item_number: u32,
}

struct PendingItem {
    id: ChunkId,
    sequence: u64,
    parent_id: Option<ChunkId>,
    is_ordered: bool,
    item_number: Option<u32>,
    text: String,
}

impl FormatChunker for MarkdownChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Markdown
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        let text = String::from_utf8_lossy(peek);
        text.lines().any(|line| {
            let trimmed = line.trim_start();
            (trimmed.starts_with('#') && trimmed.trim_start_matches('#').starts_with(' '))
                || trimmed.starts_with("```")
                || (trimmed.starts_with('|') && trimmed.contains('|'))
        })
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_TASKLISTS);
        let parser = Parser::new_ext(&text, options);

        let mut chunks = Vec::new();
        let mut sections = SectionStack::new();
        let mut list_stack: Vec<OpenList> = Vec::new();
        let mut item_stack: Vec<PendingItem> = Vec::new();

        let mut heading_level: Option<u8> = None;
        let mut heading_text = String::new();

        let mut paragraph_text: Option<String> = None;
        let mut quote_depth: u32 = 0;
        let mut quote_text: Option<String> = None;

        let mut code_lang: Option<String> = None;
        let mut code_fenced = false;
        let mut code_text: Option<String> = None;

        let mut table_headers: Vec<String> = Vec::new();
        let mut table_rows: Vec<Vec<String>> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut current_cell = String::new();
        let mut in_table_head = false;
        let mut in_table = false;

        for event in parser {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            match event {
                Event::Start(Tag::Heading(level, ..)) => {
                    heading_level = Some(heading_level_to_u8(level));
                    heading_text.clear();
                }
                Event::End(Tag::Heading(..)) => {
                    let level = heading_level.take().unwrap_or(1);
                    let metadata = ChunkMetadata::new(DocumentType::Markdown, heading_text.clone());
                    let (id, sequence) = ctx.ids.next_with_sequence();
                    let parent = sections.push(level, id);
                    let mut header =
                        crate::model::ChunkHeader::new(id, sequence, format!("Heading{level}"), metadata);
                    if let Some(parent_id) = parent {
                        header = header.with_parent(parent_id);
                    }
                    chunks.push(Chunk::new(
                        header,
                        ChunkBody::Section(SectionChunk {
                            heading_level: Some(level),
                            heading_text: heading_text.clone(),
                            ..Default::default()
                        }),
                    ));
                }
                Event::Start(Tag::Paragraph) => {
                    if item_stack.is_empty() {
                        paragraph_text = Some(String::new());
                    } else if let Some(top) = item_stack.last_mut() {
                        // A loose list item wraps its own text in a <p>; treat
                        // a second paragraph within one item as continuation
                        // text rather than a separate chunk.
                        if !top.text.is_empty() {
                            top.text.push_str("\n\n");
                        }
                    }
                }
                Event::End(Tag::Paragraph) => {
                    if item_stack.is_empty() {
                        if let Some(text) = paragraph_text.take() {
                            if !text.trim().is_empty() {
                                emit_paragraph(ctx, &mut chunks, &sections, &text);
                            }
                        }
                    }
                }
                Event::Start(Tag::List(start)) => {
                    let parent_id = item_stack
                        .last()
                        .map(|i| i.id)
                        .or_else(|| sections.current_parent());
                    list_stack.push(OpenList {
                        parent_id,
                        is_ordered: start.is_some(),
                        next_item_number: start.unwrap_or(1) as u32,
                    });
                }
                Event::End(Tag::List(_)) => {
                    list_stack.pop();
                }
                Event::Start(Tag::Item) => {
                    let (id, sequence) = ctx.ids.next_with_sequence();
                    let open = list_stack
                        .last_mut()
                        .expect("Item event only fires inside an open List");
                    let item_number = if open.is_ordered {
                        let n = open.next_item_number;
                        open.next_item_number += 1;
                        Some(n)
                    } else {
                        None
                    };
                    item_stack.push(PendingItem {
                        id,
                        sequence,
                        parent_id: open.parent_id,
                        is_ordered: open.is_ordered,
                        item_number,
                        text: String::new(),
                    });
                }
                Event::End(Tag::Item) => {
                    if let Some(item) = item_stack.pop() {
                        let metadata = ChunkMetadata::new(DocumentType::Markdown, "list item");
                        let mut header =
                            crate::model::ChunkHeader::new(item.id, item.sequence, "ListItem", metadata);
                        if let Some(parent_id) = item.parent_id {
                            header = header.with_parent(parent_id);
                        }
                        let list_level = (list_stack.len()) as u32;
                        chunks.push(Chunk::new(
                            header,
                            ChunkBody::ListItem(ListItemChunk {
                                content: item.text.trim().to_string(),
                                is_ordered: item.is_ordered,
                                item_number: item.item_number,
                                list_level,
                                ..Default::default()
                            }),
                        ));
                    }
                }
                Event::Start(Tag::BlockQuote) => {
                    quote_depth += 1;
                    if quote_text.is_none() {
                        quote_text = Some(String::new());
                    }
                }
                Event::End(Tag::BlockQuote) => {
                    quote_depth = quote_depth.saturating_sub(1);
                    if quote_depth == 0 {
                        if let Some(text) = quote_text.take() {
                            let metadata = ChunkMetadata::new(DocumentType::Markdown, "quote");
                            let parent = sections.current_parent();
                            let header = next_header_with_parent(ctx, "Quote", metadata, parent);
                            chunks.push(Chunk::new(
                                header,
                                ChunkBody::Quote(QuoteChunk {
                                    content: text.trim().to_string(),
                                    nested_depth: 0,
                                    ..Default::default()
                                }),
                            ));
                        }
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_text = Some(String::new());
                    match kind {
                        CodeBlockKind::Fenced(info) => {
                            code_fenced = true;
                            code_lang = if info.is_empty() {
                                None
                            } else {
                                Some(info.to_string())
                            };
                        }
                        CodeBlockKind::Indented => {
                            code_fenced = false;
                            code_lang = None;
                        }
                    }
                }
                Event::End(Tag::CodeBlock(_)) => {
                    if let Some(text) = code_text.take() {
                        let metadata = ChunkMetadata::new(DocumentType::Markdown, "code block");
                        let parent = sections.current_parent();
                        let header = next_header_with_parent(ctx, "CodeBlock", metadata, parent);
                        chunks.push(Chunk::new(
                            header,
                            ChunkBody::CodeBlock(CodeBlockChunk {
                                content: text,
                                language: code_lang.take(),
                                is_fenced: code_fenced,
                                is_monospace: true,
                                ..Default::default()
                            }),
                        ));
                    }
                }
                Event::Start(Tag::Table(_)) => {
                    in_table = true;
                    table_headers.clear();
                    table_rows.clear();
                }
                Event::End(Tag::Table(_)) => {
                    in_table = false;
                    let serialized = serialize_markdown_table(&table_headers, &table_rows);
                    let column_count = table_headers
                        .len()
                        .max(table_rows.iter().map(|r| r.len()).max().unwrap_or(0));
                    let table_info = TableInfo::new(table_rows.len(), column_count)
                        .with_headers(table_headers.clone());
                    let metadata = ChunkMetadata::new(DocumentType::Markdown, "table");
                    let parent = sections.current_parent();
                    let header = next_header_with_parent(ctx, "Table", metadata, parent);
                    chunks.push(Chunk::new(
                        header,
                        ChunkBody::Table(TableChunk {
                            content: serialized.clone(),
                            serialized_table: serialized,
                            serialization_format: SerializationFormat::Markdown,
                            table_info,
                        }),
                    ));
                }
                Event::Start(Tag::TableHead) => in_table_head = true,
                Event::End(Tag::TableHead) => {
                    in_table_head = false;
                    table_headers = std::mem::take(&mut current_row);
                }
                Event::Start(Tag::TableRow) => current_row.clear(),
                Event::End(Tag::TableRow) => {
                    if !in_table_head {
                        table_rows.push(std::mem::take(&mut current_row));
                    }
                }
                Event::Start(Tag::TableCell) => current_cell.clear(),
                Event::End(Tag::TableCell) => current_row.push(std::mem::take(&mut current_cell)),
                Event::Start(Tag::Image(_, url, title)) => {
                    if ctx.options.extract_images {
                        let metadata = ChunkMetadata::new(DocumentType::Markdown, "image");
                        let parent = sections.current_parent();
                        let header = next_header_with_parent(ctx, "Image", metadata, parent);
                        let caption = if title.is_empty() {
                            None
                        } else {
                            Some(title.to_string())
                        };
                        chunks.push(Chunk::new(
                            header,
                            ChunkBody::Image(ImageChunk {
                                binary_reference: url.to_string(),
                                caption,
                                ..Default::default()
                            }),
                        ));
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if in_table {
                        current_cell.push_str(&text);
                    } else if let Some(top) = item_stack.last_mut() {
                        top.text.push_str(&text);
                    } else if let Some(buf) = paragraph_text.as_mut() {
                        buf.push_str(&text);
                    } else if let Some(buf) = quote_text.as_mut() {
                        buf.push_str(&text);
                    } else if let Some(buf) = code_text.as_mut() {
                        buf.push_str(&text);
                    } else {
                        heading_text.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(buf) = code_text.as_mut() {
                        buf.push('\n');
                    } else if let Some(top) = item_stack.last_mut() {
                        top.text.push(' ');
                    } else if let Some(buf) = paragraph_text.as_mut() {
                        buf.push(' ');
                    }
                }
                _ => {}
            }
        }

        Ok(chunks)
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn next_header_with_parent(
    ctx: &mut ChunkerContext<'_>,
    specific_type: impl Into<String>,
    metadata: ChunkMetadata,
    parent: Option<ChunkId>,
) -> crate::model::ChunkHeader {
    let mut header = next_header(ctx, specific_type, metadata);
    if let Some(parent_id) = parent {
        header = header.with_parent(parent_id);
    }
    header
}

fn emit_paragraph(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, sections: &SectionStack, text: &str) {
    let parent = sections.current_parent();
    for fragment in split_into_fragments(ctx, text.trim()) {
        let metadata = ChunkMetadata::new(DocumentType::Markdown, "paragraph");
        let header = next_header_with_parent(ctx, "Paragraph", metadata, parent);
        let quality = quality_for(ctx, &fragment.text);
        chunks.push(Chunk::new(
            header.with_quality_metrics(crate::model::QualityMetrics {
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
        MarkdownChunker.chunk(text.as_bytes(), &mut ctx).unwrap()
    }

    #[test]
    fn heading_parents_following_paragraph() {
        let chunks = run("# A\n\npara1\n");
        assert_eq!(chunks.len(), 2);
        let heading_id = chunks[0].id();
        assert!(matches!(&chunks[0].body, ChunkBody::Section(s) if s.heading_text == "A"));
        assert_eq!(chunks[1].header.parent_id, Some(heading_id));
    }

    #[test]
    fn nested_heading_parents_to_shallower_heading() {
        let chunks = run("# A\n\n## B\n\npara\n");
        let a_id = chunks[0].id();
        let b = &chunks[1];
        assert!(matches!(&b.body, ChunkBody::Section(s) if s.heading_level == Some(2)));
        assert_eq!(b.header.parent_id, Some(a_id));
    }

    #[test]
    fn list_items_are_emitted_in_order_with_numbering() {
        let chunks = run("1. first\n2. second\n");
        let items: Vec<_> = chunks
            .iter()
            .filter_map(|c| match &c.body {
                ChunkBody::ListItem(item) => Some(item),
                _ => None,
            })
            .collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_number, Some(1));
        assert_eq!(items[1].item_number, Some(2));
        assert!(items[0].is_ordered);
    }

    #[test]
    fn fenced_code_block_keeps_language_and_content() {
        let chunks = run("```rust\nfn main() {}\n```\n");
        let code = chunks
            .iter()
            .find_map(|c| match &c.body {
                ChunkBody::CodeBlock(block) => Some(block),
                _ => None,
            })
            .expect("a code block chunk");
        assert_eq!(code.language.as_deref(), Some("rust"));
        assert!(code.is_fenced);
        assert!(code.content.contains("fn main()"));
    }

    #[test]
    fn table_rows_serialize_to_markdown() {
        let chunks = run("| a | b |\n| - | - |\n| 1 | 2 |\n");
        let table = chunks
            .iter()
            .find_map(|c| match &c.body {
                ChunkBody::Table(t) => Some(t),
                _ => None,
            })
            .expect("a table chunk");
        assert_eq!(table.table_info.headers, vec!["a", "b"]);
        assert_eq!(table.table_info.row_count, 1);
    }

    #[test]
    fn image_is_skipped_when_extraction_disabled() {
        let options = ChunkingOptions {
            extract_images: false,
            ..ChunkingOptions::default()
        };
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
        let chunks = MarkdownChunker
            .chunk("![alt](pic.png)\n".as_bytes(), &mut ctx)
            .unwrap();
        assert!(!chunks.iter().any(|c| matches!(c.body, ChunkBody::Image(_))));
    }
}
