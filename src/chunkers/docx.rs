//! DOCX Chunker (spec §4.9): walks `word/document.xml` directly via
//! `zip`/`quick-xml` rather than a higher-level OOXML crate, since the
//! details this chunker needs — `pStyle`, `numPr`/`ilvl`, `gridSpan`/
//! `vMerge`, `tblHeader` — sit below what read-oriented DOCX crates expose.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use zip::ZipArchive;

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker, SectionStack};
use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::{
    serialize_markdown_table, Chunk, ChunkBody, ChunkMetadata, CodeBlockChunk, DocumentType,
    ImageChunk, ListItemChunk, ParagraphChunk, QualityMetrics, SectionChunk, SerializationFormat,
    TableChunk, TableInfo, VisualType,
};

#[derive(Default)]
pub struct DocxChunker;

impl FormatChunker for DocxChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Docx
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        // DOCX is a ZIP package. Word writes `word/document.xml` among the
        // first local file headers, so it's usually visible within the
        // sniff window; fall back to the bare ZIP magic if not.
        peek.starts_with(b"PK\x03\x04") && (contains(peek, b"word/") || !contains(peek, b"ppt/") && !contains(peek, b"xl/"))
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor)
            .map_err(|e| ChunkingError::MalformedInput(format!("not a valid DOCX package: {e}")))?;

        let document_xml = read_entry(&mut archive, "word/document.xml")?;

        let mut chunks = Vec::new();
        let mut sections = SectionStack::new();
        let mut reader = Reader::from_str(&document_xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        loop {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" => {
                    let paragraph = read_paragraph(&mut reader)?;
                    emit_paragraph_like(ctx, &mut chunks, &mut sections, paragraph);
                }
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"tbl" => {
                    let table = read_table(&mut reader)?;
                    emit_table(ctx, &mut chunks, sections.current_parent(), table);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed document.xml: {err}"))),
            }
            buf.clear();
        }

        Ok(chunks)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, ChunkingError> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| ChunkingError::MalformedInput(format!("missing required part: {name}")))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ChunkingError::MalformedInput(format!("{name} is not valid UTF-8: {e}")))?;
    Ok(contents)
}

struct ParsedParagraph {
    text: String,
    style: Option<String>,
    list_level: Option<u32>,
    drawing_ref: Option<String>,
}

/// A DOCX style whose `pStyle` name indicates the paragraph should become a
/// `Heading<N>` Section rather than Content (spec §4.9 "Style-based
/// classification").
fn heading_level_from_style(style: &str) -> Option<u8> {
    let lower = style.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("heading") {
        return rest.trim().parse::<u8>().ok().filter(|l| (1..=6).contains(l));
    }
    if lower == "title" {
        return Some(1);
    }
    None
}

fn is_code_style(style: &str) -> bool {
    let lower = style.to_ascii_lowercase();
    lower.contains("code") || lower.contains("sourcecode") || lower.contains("consolas")
}

fn read_paragraph<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<ParsedParagraph, ChunkingError> {
    let mut text = String::new();
    let mut style = None;
    let mut list_level = None;
    let mut drawing_ref = None;
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"pStyle" => {
                        style = attr_value(&e, b"val");
                    }
                    b"ilvl" => {
                        list_level = attr_value(&e, b"val").and_then(|v| v.parse().ok());
                    }
                    b"numPr" => {
                        if list_level.is_none() {
                            list_level = Some(0);
                        }
                    }
                    b"t" => in_text_run = true,
                    b"blip" => {
                        drawing_ref = attr_value(&e, b"embed");
                    }
                    b"tab" => text.push('\t'),
                    b"br" => text.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if in_text_run => {
                text.push_str(&t.unescape().unwrap_or_default());
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
                if e.local_name().as_ref() == b"p" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed paragraph: {err}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok(ParsedParagraph { text, style, list_level, drawing_ref })
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == local_name {
            String::from_utf8(a.value.to_vec()).ok()
        } else {
            None
        }
    })
}

fn emit_paragraph_like(
    ctx: &mut ChunkerContext<'_>,
    chunks: &mut Vec<Chunk>,
    sections: &mut SectionStack,
    paragraph: ParsedParagraph,
) {
    if let Some(embed) = paragraph.drawing_ref.filter(|_| ctx.options.extract_images) {
        let hash = {
            let mut hasher = Sha256::new();
            hasher.update(embed.as_bytes());
            format!("{:x}", hasher.finalize())
        };
        let metadata = ChunkMetadata::new(DocumentType::Docx, "image");
        let mut header = next_header(ctx, "Image", metadata);
        if let Some(p) = sections.current_parent() {
            header = header.with_parent(p);
        }
        chunks.push(Chunk::new(
            header,
            ChunkBody::Image(ImageChunk {
                binary_reference: hash,
                visual_type: Some(VisualType::Image),
                ..Default::default()
            }),
        ));
        return;
    }

    let trimmed = paragraph.text.trim();
    if trimmed.is_empty() {
        return;
    }

    if let Some(style) = &paragraph.style {
        if let Some(level) = heading_level_from_style(style) {
            let metadata = ChunkMetadata::new(DocumentType::Docx, trimmed.to_string());
            let mut header = next_header(ctx, format!("Heading{level}"), metadata);
            let parent = sections.push(level, header.id);
            if let Some(p) = parent {
                header = header.with_parent(p);
            }
            chunks.push(Chunk::new(
                header,
                ChunkBody::Section(SectionChunk {
                    heading_level: Some(level),
                    heading_text: trimmed.to_string(),
                    ..Default::default()
                }),
            ));
            return;
        }
        if is_code_style(style) {
            let metadata = ChunkMetadata::new(DocumentType::Docx, "code block");
            let mut header = next_header(ctx, "CodeBlock", metadata);
            if let Some(p) = sections.current_parent() {
                header = header.with_parent(p);
            }
            chunks.push(Chunk::new(
                header,
                ChunkBody::CodeBlock(CodeBlockChunk {
                    content: trimmed.to_string(),
                    is_fenced: false,
                    is_monospace: true,
                    ..Default::default()
                }),
            ));
            return;
        }
    }

    if let Some(level) = paragraph.list_level {
        let metadata = ChunkMetadata::new(DocumentType::Docx, "list item");
        let mut header = next_header(ctx, "ListItem", metadata);
        if let Some(p) = sections.current_parent() {
            header = header.with_parent(p);
        }
        chunks.push(Chunk::new(
            header,
            ChunkBody::ListItem(ListItemChunk {
                content: trimmed.to_string(),
                list_level: level,
                ..Default::default()
            }),
        ));
        return;
    }

    for fragment in split_into_fragments(ctx, trimmed) {
        let metadata = ChunkMetadata::new(DocumentType::Docx, "paragraph");
        let mut header = next_header(ctx, "Paragraph", metadata);
        if let Some(p) = sections.current_parent() {
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

struct ParsedTable {
    rows: Vec<Vec<String>>,
    has_merges: bool,
    header_rows: usize,
}

fn read_table<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<ParsedTable, ChunkingError> {
    let mut rows = Vec::new();
    let mut has_merges = false;
    let mut header_rows = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tr" => {
                let (cells, is_header) = read_row(reader, &mut has_merges)?;
                if is_header {
                    header_rows += 1;
                }
                rows.push(cells);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"tbl" => break,
            Ok(Event::Eof) => break,
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed table: {err}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok(ParsedTable { rows, has_merges, header_rows })
}

fn read_row<R: std::io::BufRead>(reader: &mut Reader<R>, has_merges: &mut bool) -> Result<(Vec<String>, bool), ChunkingError> {
    let mut cells = Vec::new();
    let mut is_header_row = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tblHeader" => is_header_row = true,
                b"gridSpan" | b"vMerge" => *has_merges = true,
                _ => {}
            },
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tblHeader" => is_header_row = true,
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"gridSpan" || e.local_name().as_ref() == b"vMerge" => {
                *has_merges = true;
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tc" => {
                cells.push(read_cell_text(reader)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"tr" => break,
            Ok(Event::Eof) => break,
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed row: {err}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok((cells, is_header_row))
}

fn read_cell_text<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<String, ChunkingError> {
    let mut text = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::Text(t)) if in_text_run => text.push_str(&t.unescape().unwrap_or_default()),
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
                if e.local_name().as_ref() == b"tc" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed cell: {err}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

fn emit_table(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: Option<ChunkId>, table: ParsedTable) {
    if table.rows.is_empty() {
        return;
    }
    let headers = if table.header_rows > 0 { table.rows[0].clone() } else { Vec::new() };
    let data_rows: Vec<Vec<String>> = table.rows[table.header_rows.min(table.rows.len())..].to_vec();
    let column_count = headers
        .len()
        .max(data_rows.iter().map(|r| r.len()).max().unwrap_or(0));
    let serialized = serialize_markdown_table(&headers, &data_rows);
    let table_info = TableInfo::new(data_rows.len(), column_count)
        .with_headers(headers)
        .with_merged_cells(table.has_merges);

    let metadata = ChunkMetadata::new(DocumentType::Docx, "table");
    let mut header = next_header(ctx, "Table", metadata);
    if let Some(p) = parent {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_style_names_map_to_levels() {
        assert_eq!(heading_level_from_style("heading 1"), Some(1));
        assert_eq!(heading_level_from_style("Heading2"), Some(2));
        assert_eq!(heading_level_from_style("Title"), Some(1));
        assert_eq!(heading_level_from_style("Normal"), None);
    }

    #[test]
    fn code_style_names_are_recognized() {
        assert!(is_code_style("SourceCode"));
        assert!(is_code_style("HTMLCode"));
        assert!(!is_code_style("Normal"));
    }
}
