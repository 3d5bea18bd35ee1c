//! Contracts for external collaborators the engine may call into, but never
//! implements itself (spec §6.1, explicitly out of scope: "LLM-based
//! enrichment", "image-description providers").

use async_trait::async_trait;

/// The outcome of describing an image (spec §6.1).
#[derive(Debug, Clone)]
pub struct ImageDescription {
    pub description: String,
    pub confidence: f32,
    pub detected_objects: Vec<String>,
    pub detected_text: Option<String>,
}

/// Describes image bytes, e.g. via a hosted vision model. Called only when
/// `ChunkingOptions::generate_image_descriptions` is set; a failure yields a
/// warning and leaves `ImageChunk::generated_description` unset (spec §6.1).
#[async_trait]
pub trait ImageDescriptionProvider: Send + Sync {
    async fn describe(
        &self,
        image_bytes: &[u8],
        media_type: &str,
        existing_caption: Option<&str>,
    ) -> Result<ImageDescription, ProviderError>;
}

/// Summarizes Structural chunks and extracts keywords for Content chunks.
/// Called only when the corresponding option is enabled; failures degrade
/// silently (spec §6.1).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn summarize(&self, text: &str, max_tokens: usize) -> Result<String, ProviderError>;

    async fn extract_keywords(
        &self,
        text: &str,
        max_keywords: usize,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Opaque failure from an external collaborator; the engine folds this into
/// a `ProviderFailure` warning rather than propagating it (spec §7).
#[derive(Debug, Clone)]
pub struct ProviderError(pub String);

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProviderError {}
