//! Engine-wide configuration (spec §6.2), built with the same builder
//! pattern the rest of this codebase uses for reusable, immutable
//! configuration objects.

use crate::model::SerializationFormat;
use crate::tokenizer::{Encoding, TokenCounter};
use std::sync::Arc;

/// Whether emitted chunks are returned as a flat list or nested under their
/// parents (spec §6.2 `OutputFormat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Flat,
    Hierarchical,
}

/// Engine-wide configuration for a single chunking run (spec §6.2).
#[derive(Clone)]
pub struct ChunkingOptions {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    pub token_counting_method: Encoding,
    /// Overrides `token_counting_method` when present (spec §6.2
    /// `TokenCounter` takes precedence over `TokenCountingMethod`).
    pub token_counter: Option<Arc<dyn TokenCounter>>,
    pub extract_images: bool,
    pub generate_image_descriptions: bool,
    pub generate_summaries: bool,
    pub extract_keywords: bool,
    pub preserve_formatting: bool,
    pub generate_markdown: bool,
    pub output_format: OutputFormat,
    pub enable_streaming: bool,
    pub validate_chunks: bool,
    pub tags: Vec<String>,
    pub external_hierarchy: Option<String>,
    pub source_id: Option<String>,
    pub table_format: SerializationFormat,
    /// Minimum token count below which a Content chunk is flagged
    /// `UNDERSIZED_CHUNK`; `None` disables the check (spec §4.3 "optional").
    pub min_tokens: Option<usize>,
    /// Small bounded margin applied to `max_tokens` before a chunk is
    /// flagged oversized (spec I7 "tolerance").
    pub oversize_tolerance: usize,
    /// Deterministic id generation seed; `None` uses random ids.
    pub id_seed: Option<String>,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            overlap_tokens: 0,
            token_counting_method: Encoding::Cl100k,
            token_counter: None,
            extract_images: true,
            generate_image_descriptions: false,
            generate_summaries: false,
            extract_keywords: false,
            preserve_formatting: false,
            generate_markdown: false,
            output_format: OutputFormat::Flat,
            enable_streaming: false,
            validate_chunks: false,
            tags: Vec::new(),
            external_hierarchy: None,
            source_id: None,
            table_format: SerializationFormat::Markdown,
            min_tokens: None,
            oversize_tolerance: 0,
            id_seed: None,
        }
    }
}

/// Builder for [`ChunkingOptions`], mirroring the fluent configuration style
/// used elsewhere in this codebase.
#[derive(Clone, Default)]
pub struct ChunkingOptionsBuilder {
    options: ChunkingOptions,
}

impl ChunkingOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    pub fn overlap_tokens(mut self, overlap_tokens: usize) -> Self {
        self.options.overlap_tokens = overlap_tokens;
        self
    }

    pub fn token_counting_method(mut self, encoding: Encoding) -> Self {
        self.options.token_counting_method = encoding;
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.options.token_counter = Some(counter);
        self
    }

    pub fn extract_images(mut self, extract: bool) -> Self {
        self.options.extract_images = extract;
        self
    }

    pub fn generate_image_descriptions(mut self, enabled: bool) -> Self {
        self.options.generate_image_descriptions = enabled;
        self
    }

    pub fn generate_summaries(mut self, enabled: bool) -> Self {
        self.options.generate_summaries = enabled;
        self
    }

    pub fn extract_keywords(mut self, enabled: bool) -> Self {
        self.options.extract_keywords = enabled;
        self
    }

    pub fn preserve_formatting(mut self, enabled: bool) -> Self {
        self.options.preserve_formatting = enabled;
        self
    }

    pub fn generate_markdown(mut self, enabled: bool) -> Self {
        self.options.generate_markdown = enabled;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.options.output_format = format;
        self
    }

    pub fn enable_streaming(mut self, enabled: bool) -> Self {
        self.options.enable_streaming = enabled;
        self
    }

    pub fn validate_chunks(mut self, enabled: bool) -> Self {
        self.options.validate_chunks = enabled;
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.options.tags = tags;
        self
    }

    pub fn external_hierarchy(mut self, hierarchy: impl Into<String>) -> Self {
        self.options.external_hierarchy = Some(hierarchy.into());
        self
    }

    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.options.source_id = Some(source_id.into());
        self
    }

    pub fn table_format(mut self, format: SerializationFormat) -> Self {
        self.options.table_format = format;
        self
    }

    pub fn min_tokens(mut self, min_tokens: usize) -> Self {
        self.options.min_tokens = Some(min_tokens);
        self
    }

    pub fn oversize_tolerance(mut self, tolerance: usize) -> Self {
        self.options.oversize_tolerance = tolerance;
        self
    }

    pub fn id_seed(mut self, seed: impl Into<String>) -> Self {
        self.options.id_seed = Some(seed.into());
        self
    }

    pub fn build(self) -> ChunkingOptions {
        self.options
    }
}
