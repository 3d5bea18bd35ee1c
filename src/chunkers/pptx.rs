//! PPTX Chunker (spec §4.10): one Slide (Structural) chunk per slide, its
//! placeholders/tables/pictures as children, speaker notes from the paired
//! notes slide part. Parsed the same way as DOCX: `zip` + `quick-xml` over
//! the raw slide XML.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use zip::ZipArchive;

use super::{next_header, quality_for, split_into_fragments, ChunkerContext, FormatChunker};
use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::{
    serialize_markdown_table, Chunk, ChunkBody, ChunkMetadata, DocumentType, ImageChunk,
    NotesChunk, ParagraphChunk, QualityMetrics, SerializationFormat, SlideChunk, TableChunk,
    TableInfo, TitleChunk, VisualType,
};

#[derive(Default)]
pub struct PptxChunker;

impl FormatChunker for PptxChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pptx
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        peek.starts_with(b"PK\x03\x04") && contains(peek, b"ppt/")
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor)
            .map_err(|e| ChunkingError::MalformedInput(format!("not a valid PPTX package: {e}")))?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|n| slide_index(n));

        let mut chunks = Vec::new();
        for (i, slide_name) in slide_names.into_iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            let slide_number = (i + 1) as u32;
            let xml = read_entry(&mut archive, &slide_name)?;
            let shapes = parse_shapes(&xml)?;

            let metadata = ChunkMetadata::new(DocumentType::Pptx, format!("slide {slide_number}"))
                .with_page_number(slide_number);
            let header = next_header(ctx, "Slide", metadata);
            let slide_id = header.id;
            chunks.push(Chunk::new(
                header,
                ChunkBody::Slide(SlideChunk {
                    slide_number,
                    shape_count: shapes.len(),
                    ..Default::default()
                }),
            ));

            let mut title_used = false;
            for shape in shapes {
                if ctx.is_cancelled() {
                    return Err(ChunkingError::Cancelled);
                }
                match shape {
                    Shape::Text { is_title, text } if !text.trim().is_empty() => {
                        if is_title && !title_used {
                            title_used = true;
                            emit_title(ctx, &mut chunks, slide_id, slide_number, &text);
                        } else {
                            emit_paragraph(ctx, &mut chunks, slide_id, &text);
                        }
                    }
                    Shape::Table { headers, rows } => {
                        emit_table(ctx, &mut chunks, slide_id, headers, rows);
                    }
                    Shape::Picture { embed } => {
                        if ctx.options.extract_images {
                            emit_image(ctx, &mut chunks, slide_id, &embed);
                        }
                    }
                    _ => {}
                }
            }

            let notes_name = format!("ppt/notesSlides/notesSlide{}.xml", i + 1);
            if let Ok(notes_xml) = read_entry(&mut archive, &notes_name) {
                if let Ok(notes_shapes) = parse_shapes(&notes_xml) {
                    let notes_text: String = notes_shapes
                        .into_iter()
                        .filter_map(|s| match s {
                            Shape::Text { text, .. } => Some(text),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    let trimmed = notes_text.trim();
                    if !trimmed.is_empty() {
                        let metadata = ChunkMetadata::new(DocumentType::Pptx, "speaker notes");
                        let header = next_header(ctx, "Notes", metadata).with_parent(slide_id);
                        chunks.push(Chunk::new(
                            header,
                            ChunkBody::Notes(NotesChunk {
                                content: trimmed.to_string(),
                                notes_length: trimmed.chars().count(),
                                ..Default::default()
                            }),
                        ));
                    }
                }
            }
        }

        Ok(chunks)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn slide_index(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(0)
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, ChunkingError> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| ChunkingError::MalformedInput(format!("missing part: {name}")))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ChunkingError::MalformedInput(format!("{name} is not valid UTF-8: {e}")))?;
    Ok(contents)
}

enum Shape {
    Text { is_title: bool, text: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Picture { embed: String },
}

/// Walk a slide's shape tree (`<p:sp>`, `<p:graphicFrame>` with `<a:tbl>`,
/// `<p:pic>`), classifying text placeholders by their `<p:ph type="title"/>`.
fn parse_shapes(xml: &str) -> Result<Vec<Shape>, ChunkingError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut shapes = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"sp" => {
                shapes.push(parse_text_shape(&mut reader)?);
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tbl" => {
                shapes.push(parse_table_shape(&mut reader)?);
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"blip" => {
                if let Some(embed) = attr_value(&e, b"embed") {
                    shapes.push(Shape::Picture { embed });
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed slide XML: {err}"))),
        }
        buf.clear();
    }
    Ok(shapes)
}

fn parse_text_shape<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<Shape, ChunkingError> {
    let mut is_title = false;
    let mut text = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"ph" => {
                    if let Some(ty) = attr_value(&e, b"type") {
                        is_title = ty == "title" || ty == "ctrTitle";
                    }
                }
                b"t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&t.unescape().unwrap_or_default());
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
                if e.local_name().as_ref() == b"sp" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed shape: {err}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok(Shape::Text { is_title, text })
}

fn parse_table_shape<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<Shape, ChunkingError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tr" => {
                rows.push(parse_table_row(reader)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"tbl" => break,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed table: {err}"))),
        }
        buf.clear();
    }
    let headers = rows.first().cloned().unwrap_or_default();
    let data_rows = if rows.len() > 1 { rows[1..].to_vec() } else { Vec::new() };
    Ok(Shape::Table { headers, rows: data_rows })
}

fn parse_table_row<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<Vec<String>, ChunkingError> {
    let mut cells = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tc" => {
                cells.push(parse_cell_text(reader)?);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"tr" => break,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ChunkingError::MalformedInput(format!("malformed row: {err}"))),
        }
        buf.clear();
    }
    Ok(cells)
}

fn parse_cell_text<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<String, ChunkingError> {
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

fn attr_value(e: &quick_xml::events::BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.local_name().as_ref() == local_name {
            String::from_utf8(a.value.to_vec()).ok()
        } else {
            None
        }
    })
}

fn emit_title(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: ChunkId, slide_number: u32, text: &str) {
    let metadata = ChunkMetadata::new(DocumentType::Pptx, "title").with_page_number(slide_number);
    let header = next_header(ctx, "Title", metadata).with_parent(parent);
    chunks.push(Chunk::new(
        header,
        ChunkBody::Title(TitleChunk {
            content: text.trim().to_string(),
            slide_number,
            ..Default::default()
        }),
    ));
}

fn emit_paragraph(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: ChunkId, text: &str) {
    for fragment in split_into_fragments(ctx, text.trim()) {
        let metadata = ChunkMetadata::new(DocumentType::Pptx, "body text");
        let header = next_header(ctx, "Paragraph", metadata).with_parent(parent);
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

fn emit_table(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: ChunkId, headers: Vec<String>, rows: Vec<Vec<String>>) {
    let column_count = headers.len().max(rows.iter().map(|r| r.len()).max().unwrap_or(0));
    let serialized = serialize_markdown_table(&headers, &rows);
    let table_info = TableInfo::new(rows.len(), column_count).with_headers(headers);
    let metadata = ChunkMetadata::new(DocumentType::Pptx, "table");
    let header = next_header(ctx, "Table", metadata).with_parent(parent);
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

fn emit_image(ctx: &mut ChunkerContext<'_>, chunks: &mut Vec<Chunk>, parent: ChunkId, embed: &str) {
    let hash = {
        let mut hasher = Sha256::new();
        hasher.update(embed.as_bytes());
        format!("{:x}", hasher.finalize())
    };
    let metadata = ChunkMetadata::new(DocumentType::Pptx, "picture");
    let header = next_header(ctx, "Image", metadata).with_parent(parent);
    chunks.push(Chunk::new(
        header,
        ChunkBody::Image(ImageChunk {
            binary_reference: hash,
            visual_type: Some(VisualType::Image),
            ..Default::default()
        }),
    ));
}
