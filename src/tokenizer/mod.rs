//! Token counting and token-aware splitting (spec §4.1).
//!
//! A single chunking run uses one [`TokenCounter`] implementation, chosen by
//! [`Encoding`]. BPE encodings are backed by `tiktoken-rs`; `CharacterBased`
//! is the always-available fallback used both by explicit request and when a
//! BPE encoder table fails to load.

mod bpe;
mod character;

pub use bpe::BpeTokenCounter;
pub use character::CharacterTokenCounter;

use crate::error::ChunkingError;
use std::fmt;

/// The byte-pair encoding a [`TokenCounter`] should use (spec §4.1, §6.2
/// `TokenCountingMethod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Cl100k,
    P50k,
    R50k,
    CharacterBased,
    /// A caller-supplied encoder identified by name, resolved outside this
    /// module (spec's `TokenCounter` option takes precedence over
    /// `TokenCountingMethod` when both are present).
    Custom(&'static str),
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Cl100k => write!(f, "cl100k_base"),
            Encoding::P50k => write!(f, "p50k_base"),
            Encoding::R50k => write!(f, "r50k_base"),
            Encoding::CharacterBased => write!(f, "character"),
            Encoding::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// A token counter: counts tokens for a text and splits it into
/// token-bounded, overlapping batches (spec §4.1).
///
/// Implementations must be pure functions of their input over an immutable,
/// shareable encoder table (spec §5 "Shared resources").
pub trait TokenCounter: Send + Sync {
    /// Total token count. Empty string must count to zero. Deterministic.
    fn count(&self, text: &str) -> usize;

    /// Split `text` into batches of at most `max_tokens` tokens each, with
    /// consecutive batches overlapping by exactly `overlap` tokens.
    ///
    /// Returns `InvalidArgument` if `overlap >= max_tokens` or `max_tokens ==
    /// 0`.
    fn split_batches(
        &self,
        text: &str,
        max_tokens: usize,
        overlap: usize,
    ) -> Result<Vec<String>, ChunkingError>;

    /// The encoding this counter implements, for diagnostics and warnings.
    fn encoding(&self) -> Encoding;
}

/// Resolve an [`Encoding`] to a concrete [`TokenCounter`].
///
/// `CL100K`/`P50K`/`R50K` attempt to load their `tiktoken-rs` BPE ranks; on
/// failure the caller should emit an `EncoderUnavailable` warning and retry
/// with [`Encoding::CharacterBased`], which never fails (spec §4.1 "Failure
/// modes").
pub fn build_counter(encoding: Encoding) -> Result<Box<dyn TokenCounter>, ChunkingError> {
    match encoding {
        Encoding::Cl100k | Encoding::P50k | Encoding::R50k => {
            Ok(Box::new(BpeTokenCounter::new(encoding)?))
        }
        Encoding::CharacterBased => Ok(Box::new(CharacterTokenCounter)),
        Encoding::Custom(name) => Err(ChunkingError::EncoderUnavailable(format!(
            "no custom encoder registered for {name}"
        ))),
    }
}

/// Like [`build_counter`], but never fails: any error falls back to
/// [`CharacterTokenCounter`]. Returns the counter plus `true` if a fallback
/// occurred, so the caller can attach an `EncoderUnavailable` warning.
pub fn build_counter_or_fallback(encoding: Encoding) -> (Box<dyn TokenCounter>, bool) {
    match build_counter(encoding) {
        Ok(counter) => (counter, false),
        Err(_) => (Box::new(CharacterTokenCounter), true),
    }
}
