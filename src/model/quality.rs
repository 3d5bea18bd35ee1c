//! Per-chunk size and quality statistics (spec §3.5).

use serde::{Deserialize, Serialize};

/// Size and heuristic-quality statistics attached to a chunk.
///
/// `token_count` is always produced by the [`crate::tokenizer`] active for a
/// run; `semantic_completeness` is a chunker-assigned heuristic, not a
/// measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Tokens per the run's active [`crate::tokenizer::TokenCounter`].
    pub token_count: usize,
    /// Unicode scalar value count of `Content`.
    pub character_count: usize,
    /// Whitespace-delimited word count of `Content`.
    pub word_count: usize,
    /// 1.0 for an intact unit (e.g. a whole paragraph); lower for a fragment
    /// produced by token-aware splitting.
    pub semantic_completeness: f32,
}

impl QualityMetrics {
    /// Compute metrics for `text`, given its already-known token count.
    ///
    /// `semantic_completeness` defaults to `1.0` (an intact unit); callers
    /// that split text should construct with [`QualityMetrics::fragment`]
    /// instead.
    pub fn for_text(text: &str, token_count: usize) -> Self {
        Self {
            token_count,
            character_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            semantic_completeness: 1.0,
        }
    }

    /// Like [`QualityMetrics::for_text`] but for a fragment produced by
    /// token-aware splitting; `completeness` should be `< 1.0` for every
    /// fragment but the last (spec §4.6 splitting policy).
    pub fn fragment(text: &str, token_count: usize, completeness: f32) -> Self {
        Self {
            semantic_completeness: completeness.clamp(0.0, 1.0),
            ..Self::for_text(text, token_count)
        }
    }
}
