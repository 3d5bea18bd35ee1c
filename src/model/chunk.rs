//! The chunk data model (spec §3.1): a common header plus a tagged sum of
//! per-format-subtype bodies, per the design note in spec §9 ("Polymorphic
//! chunks → tagged variants") rather than a virtual class hierarchy.

use super::annotation::Annotation;
use super::metadata::{ChunkMetadata, DocumentType};
use super::quality::QualityMetrics;
use super::table::{SerializationFormat, TableInfo};
use crate::id::ChunkId;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The four chunk categories (spec §3.1). Recovered from a [`ChunkBody`] by
/// [`Chunk::category`] rather than stored as a separate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkCategory {
    /// Large, non-embeddable groupings. Carries no retrievable text itself.
    Structural,
    /// Small, embeddable units carrying `Content`.
    Content,
    /// An image, chart, or SmartArt reference.
    Visual,
    /// A tabular region.
    Table,
}

/// Fields shared by every chunk, independent of category or format (spec §3.1
/// "common header").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHeader {
    pub id: ChunkId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChunkId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestor_ids: Vec<ChunkId>,
    pub depth: usize,
    pub sequence_number: u64,
    pub specific_type: String,
    pub metadata: ChunkMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
}

impl ChunkHeader {
    pub fn new(id: ChunkId, sequence_number: u64, specific_type: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id,
            parent_id: None,
            ancestor_ids: Vec::new(),
            depth: 0,
            sequence_number,
            specific_type: specific_type.into(),
            metadata,
            quality_metrics: None,
        }
    }

    pub fn with_parent(mut self, parent_id: ChunkId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_quality_metrics(mut self, metrics: QualityMetrics) -> Self {
        self.quality_metrics = Some(metrics);
        self
    }
}

/// A heading's detection method, recorded on plain-text `Section`s (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingType {
    AllCaps,
    Underlined,
    Numbered,
    Prefixed,
}

/// A Visual chunk's kind (spec §4.10 `VisualType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualType {
    Image,
    Chart,
    SmartArt,
}

/// A PDF page's rotation, carried on [`PdfPageChunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdfRotation {
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

/// A heading/landmark Structural chunk: Markdown/HTML/DOCX headings,
/// plain-text headings of any detection method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    pub heading_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_type: Option<HeadingType>,
}

/// A Content paragraph: prose, PDF-extracted paragraphs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphChunk {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_likely_heading: Option<bool>,
}

/// A list item (spec §4.6/§4.7/§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemChunk {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub is_ordered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<u32>,
    pub list_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_numbered: Option<bool>,
}

/// A code block (spec §4.6/§4.7/§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeBlockChunk {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub is_fenced: bool,
    pub is_monospace: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// A blockquote (spec §4.6/§4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteChunk {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub nested_depth: u32,
}

/// A slide's title placeholder (spec §4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleChunk {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub slide_number: u32,
}

/// A slide's speaker notes (spec §4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesChunk {
    pub content: String,
    pub notes_length: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// A spreadsheet formula cell (spec §4.11).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulaChunk {
    pub content: String,
    pub cell_reference: String,
    pub formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_cells: Vec<String>,
}

/// A tabular region (spec §3.1 Table category).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableChunk {
    pub content: String,
    pub serialized_table: String,
    pub serialization_format: SerializationFormat,
    pub table_info: TableInfo,
}

/// A single data row, modeled as a one-row Table chunk with headers attached
/// (spec §3.1, §4.12): CSV data rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowChunk {
    pub content: String,
    pub serialized_table: String,
    pub serialization_format: SerializationFormat,
    pub table_info: TableInfo,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_row: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_quoted_fields: Option<bool>,
}

/// An image, chart, or SmartArt reference (spec §3.1 Visual category).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageChunk {
    pub binary_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub visual_type: Option<VisualType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_range: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub axes_titles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_legend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_cell: Option<String>,
}

/// A PDF page (spec §4.13).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfPageChunk {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub rotation: Option<PdfRotation>,
    pub text: String,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A PDF document root (spec §4.13).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfDocumentChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
    pub encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A PPTX slide (spec §4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideChunk {
    pub slide_number: u32,
    pub shape_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// An XLSX worksheet (spec §4.11).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksheetChunk {
    pub sheet_name: String,
    pub sheet_index: usize,
    pub row_count: usize,
    pub column_count: usize,
    pub is_hidden: bool,
    pub used_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A CSV document root (spec §4.12).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvDocumentChunk {
    pub delimiter: char,
    pub row_count: usize,
    pub column_count: usize,
    pub has_header_row: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    pub encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// The tagged sum of every chunk subtype this engine emits (spec §9).
#[derive(Debug, Clone)]
pub enum ChunkBody {
    Section(SectionChunk),
    Paragraph(ParagraphChunk),
    ListItem(ListItemChunk),
    CodeBlock(CodeBlockChunk),
    Quote(QuoteChunk),
    Title(TitleChunk),
    Notes(NotesChunk),
    Formula(FormulaChunk),
    Table(TableChunk),
    Row(RowChunk),
    Image(ImageChunk),
    PdfPage(PdfPageChunk),
    PdfDocument(PdfDocumentChunk),
    Slide(SlideChunk),
    Worksheet(WorksheetChunk),
    CsvDocument(CsvDocumentChunk),
}

impl ChunkBody {
    /// The category this body belongs to (spec §3.1).
    pub fn category(&self) -> ChunkCategory {
        use ChunkBody::*;
        match self {
            Section(_) | PdfPage(_) | PdfDocument(_) | Slide(_) | Worksheet(_)
            | CsvDocument(_) => ChunkCategory::Structural,
            Paragraph(_) | ListItem(_) | CodeBlock(_) | Quote(_) | Title(_) | Notes(_)
            | Formula(_) => ChunkCategory::Content,
            Table(_) | Row(_) => ChunkCategory::Table,
            Image(_) => ChunkCategory::Visual,
        }
    }
}

/// A fully-formed chunk: a common header plus its typed body.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub body: ChunkBody,
}

impl Chunk {
    pub fn new(header: ChunkHeader, body: ChunkBody) -> Self {
        Self { header, body }
    }

    pub fn category(&self) -> ChunkCategory {
        self.body.category()
    }

    pub fn id(&self) -> ChunkId {
        self.header.id
    }

    pub fn parent_id(&self) -> Option<ChunkId> {
        self.header.parent_id
    }

    /// The stable `$type` discriminator used for external serialization
    /// (spec §6.4): a closed, versioned set combining the originating format
    /// with the body's subtype (e.g. `"MarkdownParagraph"`, `"DocxTable"`,
    /// `"PptxSlide"`).
    pub fn type_tag(&self) -> &'static str {
        use ChunkBody::*;
        use DocumentType::*;
        match (self.header.metadata.document_type, &self.body) {
            (Markdown, Section(_)) => "MarkdownSection",
            (Markdown, Paragraph(_)) => "MarkdownParagraph",
            (Markdown, ListItem(_)) => "MarkdownListItem",
            (Markdown, CodeBlock(_)) => "MarkdownCodeBlock",
            (Markdown, Quote(_)) => "MarkdownQuote",
            (Markdown, Table(_)) => "MarkdownTable",
            (Markdown, Image(_)) => "MarkdownImage",

            (Html, Section(_)) => "HtmlSection",
            (Html, Paragraph(_)) => "HtmlParagraph",
            (Html, ListItem(_)) => "HtmlListItem",
            (Html, CodeBlock(_)) => "HtmlCodeBlock",
            (Html, Quote(_)) => "HtmlQuote",
            (Html, Table(_)) => "HtmlTable",
            (Html, Image(_)) => "HtmlImage",

            (PlainText, Section(_)) => "PlainTextSection",
            (PlainText, Paragraph(_)) => "PlainTextParagraph",
            (PlainText, ListItem(_)) => "PlainTextListItem",
            (PlainText, CodeBlock(_)) => "PlainTextCodeBlock",

            (Docx, Section(_)) => "DocxSection",
            (Docx, Paragraph(_)) => "DocxParagraph",
            (Docx, ListItem(_)) => "DocxListItem",
            (Docx, CodeBlock(_)) => "DocxCodeBlock",
            (Docx, Table(_)) => "DocxTable",
            (Docx, Image(_)) => "DocxImage",

            (Pptx, Slide(_)) => "PptxSlide",
            (Pptx, Title(_)) => "PptxTitle",
            (Pptx, Paragraph(_)) => "PptxParagraph",
            (Pptx, Table(_)) => "PptxTable",
            (Pptx, Image(_)) => "PptxImage",
            (Pptx, Notes(_)) => "PptxNotes",

            (Xlsx, Worksheet(_)) => "XlsxWorksheet",
            (Xlsx, Table(_)) => "XlsxTable",
            (Xlsx, Formula(_)) => "XlsxFormula",
            (Xlsx, Image(_)) => "XlsxImage",

            (Csv, CsvDocument(_)) => "CsvDocument",
            (Csv, Row(_)) => "CsvRow",

            (Pdf, PdfDocument(_)) => "PdfDocument",
            (Pdf, PdfPage(_)) => "PdfPage",
            (Pdf, Paragraph(_)) => "PdfParagraph",

            // Any other (format, body) combination is a programming error in
            // a chunker: every emitted chunk must be one of the pairs above.
            _ => "Unknown",
        }
    }
}

/// Body-shape groups used to route `$type` → the right `serde_json`
/// deserialization target. Several `$type` values share a Rust struct shape
/// (e.g. every `*Section` variant deserializes into [`SectionChunk`]).
fn body_from_tagged_value(type_tag: &str, value: &serde_json::Value) -> Result<ChunkBody, serde_json::Error> {
    macro_rules! body {
        ($variant:ident, $ty:ty) => {
            ChunkBody::$variant(serde_json::from_value::<$ty>(value.clone())?)
        };
    }
    Ok(match type_tag {
        "MarkdownSection" | "HtmlSection" | "PlainTextSection" | "DocxSection" => {
            body!(Section, SectionChunk)
        }
        "MarkdownParagraph" | "HtmlParagraph" | "PlainTextParagraph" | "DocxParagraph"
        | "PptxParagraph" | "PdfParagraph" => body!(Paragraph, ParagraphChunk),
        "MarkdownListItem" | "HtmlListItem" | "PlainTextListItem" | "DocxListItem" => {
            body!(ListItem, ListItemChunk)
        }
        "MarkdownCodeBlock" | "HtmlCodeBlock" | "PlainTextCodeBlock" | "DocxCodeBlock" => {
            body!(CodeBlock, CodeBlockChunk)
        }
        "MarkdownQuote" | "HtmlQuote" => body!(Quote, QuoteChunk),
        "MarkdownTable" | "HtmlTable" | "DocxTable" | "PptxTable" | "XlsxTable" => {
            body!(Table, TableChunk)
        }
        "MarkdownImage" | "HtmlImage" | "DocxImage" | "PptxImage" | "XlsxImage" => {
            body!(Image, ImageChunk)
        }
        "PptxSlide" => body!(Slide, SlideChunk),
        "PptxTitle" => body!(Title, TitleChunk),
        "PptxNotes" => body!(Notes, NotesChunk),
        "XlsxWorksheet" => body!(Worksheet, WorksheetChunk),
        "XlsxFormula" => body!(Formula, FormulaChunk),
        "CsvDocument" => body!(CsvDocument, CsvDocumentChunk),
        "CsvRow" => body!(Row, RowChunk),
        "PdfDocument" => body!(PdfDocument, PdfDocumentChunk),
        "PdfPage" => body!(PdfPage, PdfPageChunk),
        other => {
            return Err(serde_json::Error::custom(format!(
                "unknown chunk $type: {other}"
            )))
        }
    })
}

impl Serialize for Chunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = match serde_json::to_value(&self.header).map_err(S::Error::custom)? {
            serde_json::Value::Object(m) => m,
            _ => unreachable!("ChunkHeader always serializes to an object"),
        };
        let body_value = match &self.body {
            ChunkBody::Section(b) => serde_json::to_value(b),
            ChunkBody::Paragraph(b) => serde_json::to_value(b),
            ChunkBody::ListItem(b) => serde_json::to_value(b),
            ChunkBody::CodeBlock(b) => serde_json::to_value(b),
            ChunkBody::Quote(b) => serde_json::to_value(b),
            ChunkBody::Title(b) => serde_json::to_value(b),
            ChunkBody::Notes(b) => serde_json::to_value(b),
            ChunkBody::Formula(b) => serde_json::to_value(b),
            ChunkBody::Table(b) => serde_json::to_value(b),
            ChunkBody::Row(b) => serde_json::to_value(b),
            ChunkBody::Image(b) => serde_json::to_value(b),
            ChunkBody::PdfPage(b) => serde_json::to_value(b),
            ChunkBody::PdfDocument(b) => serde_json::to_value(b),
            ChunkBody::Slide(b) => serde_json::to_value(b),
            ChunkBody::Worksheet(b) => serde_json::to_value(b),
            ChunkBody::CsvDocument(b) => serde_json::to_value(b),
        }
        .map_err(S::Error::custom)?;
        if let serde_json::Value::Object(body_map) = body_value {
            map.extend(body_map);
        }
        map.insert(
            "$type".to_string(),
            serde_json::Value::String(self.type_tag().to_string()),
        );
        serde_json::Value::Object(map).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Chunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let type_tag = value
            .get("$type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| D::Error::missing_field("$type"))?
            .to_string();
        let header: ChunkHeader = serde_json::from_value(value.clone()).map_err(D::Error::custom)?;
        let body = body_from_tagged_value(&type_tag, &value).map_err(D::Error::custom)?;
        Ok(Chunk { header, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::ChunkMetadata;

    fn sample_chunk() -> Chunk {
        let metadata = ChunkMetadata::new(DocumentType::Markdown, "Intro");
        let header = ChunkHeader::new(ChunkId::new_random(), 0, "Heading1", metadata);
        let body = ChunkBody::Section(SectionChunk {
            heading_level: Some(1),
            heading_text: "Intro".to_string(),
            ..Default::default()
        });
        Chunk::new(header, body)
    }

    #[test]
    fn round_trips_through_json() {
        let chunk = sample_chunk();
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["$type"], "MarkdownSection");
        let restored: Chunk = serde_json::from_value(json).unwrap();
        assert_eq!(restored.header.id, chunk.header.id);
        assert_eq!(restored.type_tag(), chunk.type_tag());
    }

    #[test]
    fn null_optional_fields_are_omitted() {
        let chunk = sample_chunk();
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("parent_id").is_none());
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn category_matches_body_variant() {
        let chunk = sample_chunk();
        assert_eq!(chunk.category(), ChunkCategory::Structural);
    }

    #[test]
    fn unknown_type_tag_fails_to_deserialize() {
        let mut value = serde_json::to_value(sample_chunk()).unwrap();
        value["$type"] = serde_json::Value::String("NotARealType".to_string());
        let result: Result<Chunk, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }
}
