//! Error taxonomy for the chunking engine.
//!
//! Per the engine's error-handling policy, almost nothing in this taxonomy
//! crosses the public [`crate::engine`] boundary as an `Err`: format chunkers
//! report faults to the engine, which folds them into
//! [`ChunkingWarning`](crate::result::ChunkingWarning)s on the returned
//! [`ChunkingResult`](crate::result::ChunkingResult). The exception is
//! programming errors on the caller's side (bad options, a null/empty stream
//! where one is required) which fail fast as `Err(ChunkingError::InvalidArgument)`.

use thiserror::Error;

/// Failure modes a chunker or the engine can encounter.
///
/// Variant names mirror the taxonomy in the engine's design document rather
/// than any particular downstream wire format.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// No registered chunker claimed the input.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The format was identified but the bytes violate that format's own
    /// grammar (truncated ZIP central directory, unclosed CSV quote, ...).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Two chunks emitted by a chunker share a [`crate::id::ChunkId`].
    #[error("duplicate chunk id: {0}")]
    DuplicateId(String),

    /// A chunk's `parent_id` does not resolve within the same result.
    #[error("orphaned chunk: {0}")]
    OrphanedChunk(String),

    /// Following `parent_id` links forms a cycle.
    #[error("circular reference detected at chunk: {0}")]
    CircularReference(String),

    /// A content chunk exceeds `max_tokens` by more than the configured
    /// tolerance.
    #[error("oversized chunk: {0}")]
    OversizedChunk(String),

    /// A content chunk falls below the configured minimum size.
    #[error("undersized chunk: {0}")]
    UndersizedChunk(String),

    /// The requested token encoding failed to load or encode; callers should
    /// expect the engine to have already fallen back to character-based
    /// counting rather than propagate this further.
    #[error("token encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// An external capability (image description, LLM summarization) raised.
    #[error("provider failure: {0}")]
    ProviderFailure(String),

    /// The caller's cancellation handle fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A caller-supplied argument is invalid on its face (e.g.
    /// `overlap_tokens >= max_tokens`) and cannot be degraded to a warning.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Wraps an underlying I/O failure reading the input stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps a `serde_json` failure during result serialization.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChunkingError {
    /// Machine-readable code matching spec §4.3/§7 (`ORPHANED_CHUNK`, etc.),
    /// used when an error is downgraded into a
    /// [`crate::result::ChunkingWarning`] or a
    /// [`crate::validator::ValidationIssue`].
    pub fn code(&self) -> &'static str {
        match self {
            ChunkingError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ChunkingError::MalformedInput(_) => "MALFORMED_INPUT",
            ChunkingError::DuplicateId(_) => "DUPLICATE_ID",
            ChunkingError::OrphanedChunk(_) => "ORPHANED_CHUNK",
            ChunkingError::CircularReference(_) => "CIRCULAR_REFERENCE",
            ChunkingError::OversizedChunk(_) => "OVERSIZED_CHUNK",
            ChunkingError::UndersizedChunk(_) => "UNDERSIZED_CHUNK",
            ChunkingError::EncoderUnavailable(_) => "ENCODER_UNAVAILABLE",
            ChunkingError::ProviderFailure(_) => "PROVIDER_FAILURE",
            ChunkingError::Cancelled => "CANCELLED",
            ChunkingError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ChunkingError::Io(_) => "IO_ERROR",
            ChunkingError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
