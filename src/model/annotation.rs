//! Formatting spans attached to a `Content` chunk's text (spec §3.3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of formatting an [`Annotation`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    Image,
    Code,
    Highlight,
    Subscript,
    Superscript,
}

/// A formatting span over a half-open, non-negative character range of the
/// owning chunk's `Content`. Spans may overlap; deeper formatting nests on
/// top of shallower formatting rather than replacing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub start: usize,
    pub end: usize,
    /// Free-form attributes, e.g. `href` for a [`AnnotationKind::Link`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(kind: AnnotationKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            attributes: BTreeMap::new(),
        }
    }

    pub fn link(start: usize, end: usize, href: impl Into<String>) -> Self {
        let mut a = Self::new(AnnotationKind::Link, start, end);
        a.attributes.insert("href".to_string(), href.into());
        a
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// `true` if the span lies within `[0, len]` and `start <= end`.
    pub fn is_valid_for(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}
