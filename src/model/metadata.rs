//! Source-tracking metadata attached to every chunk (spec §3.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The document format a chunk originated from. Doubles as the dispatch key
/// for [`crate::registry`] and the format-prefix half of a chunk's `$type`
/// (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Markdown,
    Html,
    PlainText,
    Docx,
    Pptx,
    Xlsx,
    Csv,
    Pdf,
}

impl DocumentType {
    /// Canonical file extension (without the leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            DocumentType::Markdown => "md",
            DocumentType::Html => "html",
            DocumentType::PlainText => "txt",
            DocumentType::Docx => "docx",
            DocumentType::Pptx => "pptx",
            DocumentType::Xlsx => "xlsx",
            DocumentType::Csv => "csv",
            DocumentType::Pdf => "pdf",
        }
    }

    /// Map a file name's extension to a [`DocumentType`] (spec §4.5 "by
    /// file-name hint").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(DocumentType::Markdown),
            "html" | "htm" => Some(DocumentType::Html),
            "txt" => Some(DocumentType::PlainText),
            "docx" => Some(DocumentType::Docx),
            "pptx" => Some(DocumentType::Pptx),
            "xlsx" => Some(DocumentType::Xlsx),
            "csv" => Some(DocumentType::Csv),
            "pdf" => Some(DocumentType::Pdf),
            _ => None,
        }
    }
}

/// Source-tracking information carried on every chunk (spec §3.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Human-readable path, e.g. `"csv/row3"` or `"Section 1.2 > Introduction"`.
    pub internal_hierarchy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_hierarchy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, serde_json::Value>,
}

impl ChunkMetadata {
    /// A metadata record for `document_type` with `internal_hierarchy` set
    /// and everything else defaulted. `created_at` is stamped at
    /// construction time, so metadata records are not reproducible byte-for-
    /// byte across runs started at different instants; only `sequence_number`
    /// and `Id` (when seeded) are covered by the determinism guarantee.
    pub fn new(document_type: DocumentType, internal_hierarchy: impl Into<String>) -> Self {
        Self {
            document_type,
            source_path: None,
            source_id: None,
            internal_hierarchy: internal_hierarchy.into(),
            external_hierarchy: None,
            page_number: None,
            sheet_name: None,
            tags: Vec::new(),
            bounding_box: None,
            language: None,
            created_at: Utc::now(),
            custom: BTreeMap::new(),
        }
    }

    pub fn with_source_path(mut self, path: PathBuf) -> Self {
        self.source_path = Some(path);
        self
    }

    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    pub fn with_page_number(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    pub fn with_sheet_name(mut self, sheet: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet.into());
        self
    }

    pub fn with_bounding_box(mut self, bbox: impl Into<String>) -> Self {
        self.bounding_box = Some(bbox.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_external_hierarchy(mut self, hierarchy: impl Into<String>) -> Self {
        self.external_hierarchy = Some(hierarchy.into());
        self
    }
}
