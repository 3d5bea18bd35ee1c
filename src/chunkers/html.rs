//! HTML Chunker (spec §4.7): walks a permissively-parsed DOM in document
//! order via `scraper`/`html5ever`.

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker};
use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::{
    serialize_markdown_table, Annotation, AnnotationKind, Chunk, ChunkBody, ChunkMetadata,
    CodeBlockChunk, DocumentType, ImageChunk, ListItemChunk, ParagraphChunk, QuoteChunk,
    SectionChunk, SerializationFormat, TableChunk, TableInfo, VisualType,
};
use scraper::{ElementRef, Html, Node};

#[derive(Default)]
pub struct HtmlChunker;

/// A frame on the combined heading/landmark parenting stack. Headings nest
/// by level (spec §4.6, reused verbatim by §4.7); landmark elements nest by
/// literal DOM structure, popped when recursion returns from their subtree.
enum Frame {
    Heading(u8, ChunkId),
    Landmark(ChunkId),
}

impl FormatChunker for HtmlChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Html
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        let text = String::from_utf8_lossy(peek).to_ascii_lowercase();
        ["<html", "<!doctype", "<body", "<div", "<p>"]
            .iter()
            .any(|needle| text.contains(needle))
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let document = Html::parse_document(&text);
        let mut chunks = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        walk(document.root_element(), ctx, &mut chunks, &mut stack)?;
        Ok(chunks)
    }
}

fn current_parent(stack: &[Frame]) -> Option<ChunkId> {
    stack.last().map(|f| match f {
        Frame::Heading(_, id) => *id,
        Frame::Landmark(id) => *id,
    })
}

fn walk(
    element: ElementRef<'_>,
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    stack: &mut Vec<Frame>,
) -> Result<(), ChunkingError> {
    for child in element.children() {
        if ctx.is_cancelled() {
            return Err(ChunkingError::Cancelled);
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = child_el.value().name();

        match tag {
            "script" | "style" => continue,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<u8>().unwrap_or(1);
                while matches!(stack.last(), Some(Frame::Heading(l, _)) if *l >= level) {
                    stack.pop();
                }
                let (text, annotations) = extract_text(child_el);
                let parent = current_parent(stack);
                let metadata = ChunkMetadata::new(DocumentType::Html, text.clone());
                let mut header = next_header(ctx, format!("Heading{level}"), metadata);
                if let Some(p) = parent {
                    header = header.with_parent(p);
                }
                let id = header.id;
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::Section(SectionChunk {
                        heading_level: Some(level),
                        heading_text: text,
                        tag_name: Some(tag.to_string()),
                        css_classes: css_classes(child_el),
                        element_id: element_id(child_el),
                        aria_role: aria_role(child_el),
                        ..Default::default()
                    }),
                ));
                let _ = annotations; // headings don't carry inline annotations of their own
                stack.push(Frame::Heading(level, id));
            }
            "article" | "section" | "main" | "aside" | "header" | "footer" | "nav" => {
                let parent = current_parent(stack);
                let metadata = ChunkMetadata::new(DocumentType::Html, tag.to_string());
                let mut header = next_header(ctx, "Landmark", metadata);
                if let Some(p) = parent {
                    header = header.with_parent(p);
                }
                let id = header.id;
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::Section(SectionChunk {
                        tag_name: Some(tag.to_string()),
                        css_classes: css_classes(child_el),
                        element_id: element_id(child_el),
                        aria_role: aria_role(child_el),
                        ..Default::default()
                    }),
                ));
                let mark = stack.len();
                stack.push(Frame::Landmark(id));
                walk(child_el, ctx, chunks, stack)?;
                stack.truncate(mark);
            }
            "p" => {
                let (text, annotations) = extract_text(child_el);
                emit_paragraph(ctx, chunks, current_parent(stack), &text, annotations);
            }
            "pre" => {
                let code_el = child_el
                    .children()
                    .find_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "code")
                    .unwrap_or(child_el);
                let (text, _) = extract_text(code_el);
                let language = css_classes(code_el)
                    .into_iter()
                    .find_map(|c| c.strip_prefix("language-").map(str::to_string));
                let parent = current_parent(stack);
                let metadata = ChunkMetadata::new(DocumentType::Html, "code block");
                let mut header = next_header(ctx, "CodeBlock", metadata);
                if let Some(p) = parent {
                    header = header.with_parent(p);
                }
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::CodeBlock(CodeBlockChunk {
                        content: text,
                        language,
                        is_fenced: false,
                        is_monospace: true,
                        ..Default::default()
                    }),
                ));
            }
            "blockquote" => {
                let (text, annotations) = extract_text(child_el);
                let parent = current_parent(stack);
                let metadata = ChunkMetadata::new(DocumentType::Html, "quote");
                let mut header = next_header(ctx, "Quote", metadata);
                if let Some(p) = parent {
                    header = header.with_parent(p);
                }
                chunks.push(Chunk::new(
                    header,
                    ChunkBody::Quote(QuoteChunk {
                        content: text,
                        annotations,
                        nested_depth: 0,
                        ..Default::default()
                    }),
                ));
            }
            "ul" | "ol" => {
                walk_list(child_el, ctx, chunks, current_parent(stack), tag == "ol", 1)?;
            }
            "table" => {
                emit_table(child_el, ctx, chunks, current_parent(stack));
            }
            "img" => {
                if ctx.options.extract_images {
                    let src = child_el.value().attr("src").unwrap_or_default().to_string();
                    let alt = child_el.value().attr("alt").map(str::to_string);
                    let parent = current_parent(stack);
                    let metadata = ChunkMetadata::new(DocumentType::Html, "image");
                    let mut header = next_header(ctx, "Image", metadata);
                    if let Some(p) = parent {
                        header = header.with_parent(p);
                    }
                    chunks.push(Chunk::new(
                        header,
                        ChunkBody::Image(ImageChunk {
                            binary_reference: src,
                            caption: alt,
                            visual_type: Some(VisualType::Image),
                            ..Default::default()
                        }),
                    ));
                }
            }
            _ => {
                // Transparent container (div, span, body, html, ...): recurse
                // without changing the parenting scope.
                walk(child_el, ctx, chunks, stack)?;
            }
        }
    }
    Ok(())
}

fn walk_list(
    list_el: ElementRef<'_>,
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    parent_id: Option<ChunkId>,
    is_ordered: bool,
    list_level: u32,
) -> Result<(), ChunkingError> {
    let mut item_number = 1u32;
    for child in list_el.children() {
        let Some(li) = ElementRef::wrap(child) else { continue };
        if li.value().name() != "li" {
            continue;
        }
        let (text, annotations) = extract_text_excluding_lists(li);
        let metadata = ChunkMetadata::new(DocumentType::Html, "list item");
        let mut header = next_header(ctx, "ListItem", metadata);
        if let Some(p) = parent_id {
            header = header.with_parent(p);
        }
        let item_id = header.id;
        chunks.push(Chunk::new(
            header,
            ChunkBody::ListItem(ListItemChunk {
                content: text,
                annotations,
                is_ordered,
                item_number: if is_ordered { Some(item_number) } else { None },
                list_level,
                ..Default::default()
            }),
        ));
        if is_ordered {
            item_number += 1;
        }
        for nested in li.children().filter_map(ElementRef::wrap) {
            let nested_tag = nested.value().name();
            if nested_tag == "ul" || nested_tag == "ol" {
                walk_list(nested, ctx, chunks, Some(item_id), nested_tag == "ol", list_level + 1)?;
            }
        }
    }
    Ok(())
}

fn emit_table(
    table_el: ElementRef<'_>,
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    parent_id: Option<ChunkId>,
) {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for section in table_el.children().filter_map(ElementRef::wrap) {
        match section.value().name() {
            "thead" => {
                if let Some(row) = section.children().filter_map(ElementRef::wrap).next() {
                    headers = row_cells(row);
                }
            }
            "tbody" | "tfoot" => {
                for row in section.children().filter_map(ElementRef::wrap) {
                    if row.value().name() == "tr" {
                        rows.push(row_cells(row));
                    }
                }
            }
            "tr" => rows.push(row_cells(section)),
            _ => {}
        }
    }
    let serialized = serialize_markdown_table(&headers, &rows);
    let column_count = headers.len().max(rows.iter().map(|r| r.len()).max().unwrap_or(0));
    let table_info = TableInfo::new(rows.len(), column_count).with_headers(headers.clone());
    let metadata = ChunkMetadata::new(DocumentType::Html, "table");
    let mut header = next_header(ctx, "Table", metadata);
    if let Some(p) = parent_id {
        header = header.with_parent(p);
    }
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

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "td" || c.value().name() == "th")
        .map(|c| extract_text(c).0)
        .collect()
}

fn emit_paragraph(
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    parent: Option<ChunkId>,
    text: &str,
    annotations: Vec<Annotation>,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    // Annotation spans are only valid for the first, unsplit fragment; a
    // paragraph long enough to split loses its fine-grained spans, matching
    // how `SemanticCompleteness` already marks it as a fragment.
    let fragments = split_into_fragments(ctx, trimmed);
    let single = fragments.len() == 1;
    for fragment in fragments {
        let metadata = ChunkMetadata::new(DocumentType::Html, "paragraph");
        let mut header = next_header(ctx, "Paragraph", metadata);
        if let Some(p) = parent {
            header = header.with_parent(p);
        }
        let quality = quality_for(ctx, &fragment.text);
        chunks.push(Chunk::new(
            header.with_quality_metrics(crate::model::QualityMetrics {
                semantic_completeness: fragment.completeness,
                ..quality
            }),
            ChunkBody::Paragraph(ParagraphChunk {
                content: fragment.text,
                annotations: if single { annotations.clone() } else { Vec::new() },
                ..Default::default()
            }),
        ));
    }
}

fn css_classes(el: ElementRef<'_>) -> Vec<String> {
    el.value()
        .attr("class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn element_id(el: ElementRef<'_>) -> Option<String> {
    el.value().attr("id").map(str::to_string)
}

fn aria_role(el: ElementRef<'_>) -> Option<String> {
    el.value().attr("role").map(str::to_string)
}

fn annotation_kind_for(tag: &str) -> Option<AnnotationKind> {
    match tag {
        "b" | "strong" => Some(AnnotationKind::Bold),
        "i" | "em" => Some(AnnotationKind::Italic),
        "u" => Some(AnnotationKind::Underline),
        "s" | "strike" | "del" => Some(AnnotationKind::Strikethrough),
        "a" => Some(AnnotationKind::Link),
        "code" => Some(AnnotationKind::Code),
        "mark" => Some(AnnotationKind::Highlight),
        "sub" => Some(AnnotationKind::Subscript),
        "sup" => Some(AnnotationKind::Superscript),
        _ => None,
    }
}

/// Flatten `element`'s text content, recording an [`Annotation`] span for
/// every inline formatting tag encountered (spec §4.7 "Inline formatting
/// ... populates the owning Content chunk's annotation list").
fn extract_text(element: ElementRef<'_>) -> (String, Vec<Annotation>) {
    let mut text = String::new();
    let mut annotations = Vec::new();
    extract_into(element, &mut text, &mut annotations, true);
    (text.trim().to_string(), annotations)
}

/// Like [`extract_text`] but treats nested `<ul>`/`<ol>` as opaque, since
/// those are walked separately by [`walk_list`].
fn extract_text_excluding_lists(element: ElementRef<'_>) -> (String, Vec<Annotation>) {
    let mut text = String::new();
    let mut annotations = Vec::new();
    extract_into(element, &mut text, &mut annotations, false);
    (text.trim().to_string(), annotations)
}

fn extract_into(element: ElementRef<'_>, text: &mut String, annotations: &mut Vec<Annotation>, recurse_lists: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else { continue };
                let tag = el.name();
                if !recurse_lists && (tag == "ul" || tag == "ol") {
                    continue;
                }
                if tag == "br" {
                    text.push(' ');
                    continue;
                }
                let start = text.chars().count();
                extract_into(child_el, text, annotations, recurse_lists);
                let end = text.chars().count();
                if let Some(kind) = annotation_kind_for(tag) {
                    let mut annotation = Annotation::new(kind, start, end);
                    if tag == "a" {
                        if let Some(href) = el.attr("href") {
                            annotation = annotation.with_attribute("href", href);
                        }
                    }
                    annotations.push(annotation);
                }
            }
            _ => {}
        }
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

    fn run(html: &str) -> Vec<Chunk> {
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
        HtmlChunker.chunk(html.as_bytes(), &mut ctx).unwrap()
    }

    #[test]
    fn heading_parents_following_paragraph() {
        let chunks = run("<h1>A</h1><p>para1</p>");
        let heading = chunks
            .iter()
            .find(|c| matches!(&c.body, ChunkBody::Section(s) if s.heading_text == "A"))
            .expect("a heading chunk");
        let para = chunks
            .iter()
            .find(|c| matches!(c.body, ChunkBody::Paragraph(_)))
            .expect("a paragraph chunk");
        assert_eq!(para.header.parent_id, Some(heading.id()));
    }

    #[test]
    fn landmark_scope_is_restored_after_its_subtree() {
        let chunks = run("<article><h2>Inner</h2><p>one</p></article><p>two</p>");
        let article = chunks
            .iter()
            .find(|c| matches!(&c.body, ChunkBody::Section(s) if s.tag_name.as_deref() == Some("article")))
            .expect("a landmark chunk");
        let paragraphs: Vec<_> = chunks
            .iter()
            .filter(|c| matches!(c.body, ChunkBody::Paragraph(_)))
            .collect();
        assert_eq!(paragraphs.len(), 2);
        // "two" sits outside the <article>, so it must not parent to anything inside it.
        assert_ne!(paragraphs[1].header.parent_id, Some(article.id()));
    }

    #[test]
    fn ordered_list_items_increment_and_nested_list_parents_to_item() {
        let chunks = run("<ol><li>first<ul><li>nested</li></ul></li><li>second</li></ol>");
        let items: Vec<_> = chunks
            .iter()
            .filter_map(|c| match &c.body {
                ChunkBody::ListItem(item) => Some((c, item)),
                _ => None,
            })
            .collect();
        assert_eq!(items.len(), 3);
        let (first_chunk, first_item) = &items[0];
        assert_eq!(first_item.item_number, Some(1));
        let (_, nested_item) = &items[1];
        assert_eq!(nested_item.list_level, 2);
        assert_eq!(items[1].0.header.parent_id, Some(first_chunk.id()));
        let (_, second_item) = &items[2];
        assert_eq!(second_item.item_number, Some(2));
    }

    #[test]
    fn table_with_thead_and_tbody_is_captured() {
        let chunks = run("<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>");
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
    fn inline_formatting_produces_annotation_spans() {
        let chunks = run("<p>hello <b>bold</b> world</p>");
        let paragraph = chunks
            .iter()
            .find_map(|c| match &c.body {
                ChunkBody::Paragraph(p) => Some(p),
                _ => None,
            })
            .expect("a paragraph chunk");
        assert_eq!(paragraph.content, "hello bold world");
        let bold = paragraph
            .annotations
            .iter()
            .find(|a| a.kind == AnnotationKind::Bold)
            .expect("a bold annotation span");
        assert_eq!(&paragraph.content[bold.start..bold.end], "bold");
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
        let chunks = HtmlChunker
            .chunk("<img src=\"pic.png\" alt=\"a pic\">".as_bytes(), &mut ctx)
            .unwrap();
        assert!(!chunks.iter().any(|c| matches!(c.body, ChunkBody::Image(_))));
    }
}
