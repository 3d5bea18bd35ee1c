use super::{Encoding, TokenCounter};
use crate::error::ChunkingError;
use tiktoken_rs::CoreBPE;

/// An OpenAI-compatible BPE counter backed by `tiktoken-rs` (spec §4.1 "BPE
/// variants"). Safe to share across concurrent runs: `CoreBPE`'s rank tables
/// are immutable once constructed.
pub struct BpeTokenCounter {
    bpe: CoreBPE,
    encoding: Encoding,
}

impl BpeTokenCounter {
    pub fn new(encoding: Encoding) -> Result<Self, ChunkingError> {
        let bpe = match encoding {
            Encoding::Cl100k => tiktoken_rs::cl100k_base(),
            Encoding::P50k => tiktoken_rs::p50k_base(),
            Encoding::R50k => tiktoken_rs::r50k_base(),
            _ => unreachable!("BpeTokenCounter is only constructed for BPE encodings"),
        }
        .map_err(|e| ChunkingError::EncoderUnavailable(format!("{encoding}: {e}")))?;
        Ok(Self { bpe, encoding })
    }

    fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_ordinary(text)
    }

    /// Decode a token slice, growing it on either side until the decoded
    /// bytes form valid UTF-8 (spec §4.1 "the splitter must not split inside
    /// a token"). `tokens` is the full token stream; `range` is the
    /// candidate boundary-aligned slice.
    fn decode_extending(&self, tokens: &[usize], mut start: usize, mut end: usize) -> String {
        loop {
            if let Ok(text) = self.bpe.decode(tokens[start..end].to_vec()) {
                return text;
            }
            if end < tokens.len() {
                end += 1;
            } else if start > 0 {
                start -= 1;
            } else {
                // Nothing left to extend; give up rather than loop forever.
                return String::new();
            }
        }
    }
}

impl TokenCounter for BpeTokenCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.encode(text).len()
    }

    fn split_batches(
        &self,
        text: &str,
        max_tokens: usize,
        overlap: usize,
    ) -> Result<Vec<String>, ChunkingError> {
        if max_tokens == 0 || overlap >= max_tokens {
            return Err(ChunkingError::InvalidArgument(format!(
                "overlap ({overlap}) must be < max_tokens ({max_tokens})"
            )));
        }
        let tokens = self.encode(text);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let stride = max_tokens - overlap;
        let mut batches = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let end = (start + max_tokens).min(tokens.len());
            batches.push(self.decode_extending(&tokens, start, end));
            if end == tokens.len() {
                break;
            }
            start += stride;
        }
        Ok(batches)
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }
}
