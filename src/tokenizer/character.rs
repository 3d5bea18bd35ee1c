use super::{Encoding, TokenCounter};
use crate::error::ChunkingError;

/// `count = ceil(len(text) / 4)` (spec §4.1 "CharacterBased variant"). The
/// always-available fallback; never fails.
pub struct CharacterTokenCounter;

const CHARS_PER_TOKEN: usize = 4;

impl TokenCounter for CharacterTokenCounter {
    fn count(&self, text: &str) -> usize {
        let len = text.chars().count();
        (len + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
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
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Ok(Vec::new());
        }

        let max_chars = max_tokens * CHARS_PER_TOKEN;
        let overlap_chars = overlap * CHARS_PER_TOKEN;
        let stride = max_chars - overlap_chars;

        let mut batches = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + max_chars).min(chars.len());
            batches.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        Ok(batches)
    }

    fn encoding(&self) -> Encoding {
        Encoding::CharacterBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_empty_string_as_zero() {
        assert_eq!(CharacterTokenCounter.count(""), 0);
    }

    #[test]
    fn rounds_up_to_nearest_token() {
        assert_eq!(CharacterTokenCounter.count("abcde"), 2);
        assert_eq!(CharacterTokenCounter.count("abcd"), 1);
    }

    #[test]
    fn split_batches_respects_overlap() {
        let text = "a".repeat(40);
        let batches = CharacterTokenCounter.split_batches(&text, 4, 1).unwrap();
        assert!(batches.len() > 1);
        for batch in &batches {
            assert!(CharacterTokenCounter.count(batch) <= 4);
        }
    }
}
