//! Chunk Validator (spec §4.3): reports invariant violations without
//! mutating its input.

use crate::id::ChunkId;
use crate::model::Chunk;
use std::collections::{HashMap, HashSet};

/// Severity of a [`ValidationIssue`], independent of
/// [`crate::result::WarningLevel`] since validation issues are carried in
/// [`ValidationResult`], not in a run's warning list (spec §7 policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub chunk_id: Option<ChunkId>,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub has_orphaned: bool,
    pub has_cycles: bool,
    pub oversized: Vec<ChunkId>,
    pub undersized: Vec<ChunkId>,
    pub has_invalid_hierarchy: bool,
}

/// Options controlling size-policy checks; everything else in §3.2 is
/// checked unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    pub max_tokens: usize,
    /// Small bounded margin for structural-boundary oversizing (spec I7).
    pub oversize_tolerance: usize,
    /// Minimum token count for a Content chunk; `None` disables the check
    /// (spec §4.3 "optional").
    pub min_tokens: Option<usize>,
}

/// Run the full §4.3 check suite against an already hierarchy-resolved chunk
/// list. Never mutates `chunks`.
pub fn validate(chunks: &[Chunk], options: ValidationOptions) -> ValidationResult {
    let mut issues = Vec::new();
    let mut has_orphaned = false;
    let mut has_cycles = false;
    let mut oversized = Vec::new();
    let mut undersized = Vec::new();
    let mut has_invalid_hierarchy = false;

    let mut seen_ids: HashMap<ChunkId, usize> = HashMap::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if let Some(&first) = seen_ids.get(&chunk.id()) {
            issues.push(ValidationIssue {
                severity: Severity::Error,
                code: "DUPLICATE_ID",
                message: format!(
                    "chunk id {} appears at positions {} and {}",
                    chunk.id(),
                    first,
                    i
                ),
                chunk_id: Some(chunk.id()),
            });
        } else {
            seen_ids.insert(chunk.id(), i);
        }
    }

    let by_id: HashMap<ChunkId, &Chunk> = chunks.iter().map(|c| (c.id(), c)).collect();

    for chunk in chunks {
        // I2 parent resolution.
        if let Some(parent_id) = chunk.parent_id() {
            if !by_id.contains_key(&parent_id) {
                has_orphaned = true;
                issues.push(ValidationIssue {
                    severity: Severity::Warning,
                    code: "ORPHANED_CHUNK",
                    message: format!("chunk {} references missing parent {parent_id}", chunk.id()),
                    chunk_id: Some(chunk.id()),
                });
            }
        }

        // I4 depth consistency.
        let expected_depth = match chunk.parent_id().and_then(|p| by_id.get(&p)) {
            Some(parent) => parent.header.depth + 1,
            None => 0,
        };
        if chunk.header.depth != expected_depth {
            has_invalid_hierarchy = true;
            issues.push(ValidationIssue {
                severity: Severity::Error,
                code: "DEPTH_MISMATCH",
                message: format!(
                    "chunk {} has depth {} but expected {}",
                    chunk.id(),
                    chunk.header.depth,
                    expected_depth
                ),
                chunk_id: Some(chunk.id()),
            });
        }

        // I5 ancestor consistency.
        if chunk.header.ancestor_ids.len() != chunk.header.depth {
            has_invalid_hierarchy = true;
            issues.push(ValidationIssue {
                severity: Severity::Error,
                code: "ANCESTOR_LENGTH_MISMATCH",
                message: format!(
                    "chunk {} has {} ancestors but depth {}",
                    chunk.id(),
                    chunk.header.ancestor_ids.len(),
                    chunk.header.depth
                ),
                chunk_id: Some(chunk.id()),
            });
        } else {
            for ancestor_id in &chunk.header.ancestor_ids {
                if !by_id.contains_key(ancestor_id) {
                    has_invalid_hierarchy = true;
                    issues.push(ValidationIssue {
                        severity: Severity::Error,
                        code: "ANCESTOR_NOT_FOUND",
                        message: format!(
                            "chunk {} lists ancestor {} which is not in the result",
                            chunk.id(),
                            ancestor_id
                        ),
                        chunk_id: Some(chunk.id()),
                    });
                }
            }
        }

        // I7 token budget (soft), Content chunks only.
        if let Some(metrics) = &chunk.header.quality_metrics {
            if chunk.category() == crate::model::ChunkCategory::Content {
                if metrics.token_count > options.max_tokens + options.oversize_tolerance {
                    oversized.push(chunk.id());
                    issues.push(ValidationIssue {
                        severity: Severity::Warning,
                        code: "OVERSIZED_CHUNK",
                        message: format!(
                            "chunk {} has {} tokens, exceeding {} (+{} tolerance)",
                            chunk.id(),
                            metrics.token_count,
                            options.max_tokens,
                            options.oversize_tolerance
                        ),
                        chunk_id: Some(chunk.id()),
                    });
                }
                if let Some(min_tokens) = options.min_tokens {
                    if metrics.token_count < min_tokens {
                        undersized.push(chunk.id());
                        issues.push(ValidationIssue {
                            severity: Severity::Info,
                            code: "UNDERSIZED_CHUNK",
                            message: format!(
                                "chunk {} has {} tokens, below minimum {}",
                                chunk.id(),
                                metrics.token_count,
                                min_tokens
                            ),
                            chunk_id: Some(chunk.id()),
                        });
                    }
                }
            }
        }
    }

    // I3 acyclic: walk parent_id from every chunk, bounded by result size.
    for chunk in chunks {
        let mut current = chunk.parent_id();
        let mut seen = HashSet::new();
        seen.insert(chunk.id());
        let mut steps = 0;
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                has_cycles = true;
                issues.push(ValidationIssue {
                    severity: Severity::Error,
                    code: "CIRCULAR_REFERENCE",
                    message: format!("cycle detected reaching chunk {}", chunk.id()),
                    chunk_id: Some(chunk.id()),
                });
                break;
            }
            steps += 1;
            if steps > chunks.len() {
                // Guards against an unreachable parent chain longer than the
                // result itself; treated the same as a detected cycle.
                has_cycles = true;
                break;
            }
            current = by_id.get(&parent_id).and_then(|c| c.parent_id());
        }
    }

    // I6 sequence monotonicity.
    let mut last_sequence: Option<u64> = None;
    for chunk in chunks {
        if let Some(last) = last_sequence {
            if chunk.header.sequence_number <= last {
                issues.push(ValidationIssue {
                    severity: Severity::Error,
                    code: "SEQUENCE_NOT_MONOTONIC",
                    message: format!(
                        "chunk {} has sequence_number {} which does not exceed preceding {}",
                        chunk.id(),
                        chunk.header.sequence_number,
                        last
                    ),
                    chunk_id: Some(chunk.id()),
                });
            }
        }
        last_sequence = Some(chunk.header.sequence_number);
    }

    let is_valid = !issues.iter().any(|i| i.severity == Severity::Error);

    ValidationResult {
        is_valid,
        issues,
        has_orphaned,
        has_cycles,
        oversized,
        undersized,
        has_invalid_hierarchy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Chunk, ChunkBody, ChunkHeader, ChunkMetadata, DocumentType, ParagraphChunk, QualityMetrics,
    };

    fn paragraph(id: ChunkId, seq: u64, depth: usize, tokens: usize) -> Chunk {
        let metadata = ChunkMetadata::new(DocumentType::Markdown, "root");
        let mut header = ChunkHeader::new(id, seq, "Paragraph", metadata)
            .with_quality_metrics(QualityMetrics::for_text("text", tokens));
        header.depth = depth;
        Chunk::new(
            header,
            ChunkBody::Paragraph(ParagraphChunk {
                content: "text".into(),
                ..Default::default()
            }),
        )
    }

    fn default_options() -> ValidationOptions {
        ValidationOptions {
            max_tokens: 100,
            oversize_tolerance: 0,
            min_tokens: None,
        }
    }

    #[test]
    fn valid_single_chunk_passes() {
        let chunks = vec![paragraph(ChunkId::new_random(), 0, 0, 10)];
        let result = validate(&chunks, default_options());
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn oversized_chunk_is_flagged() {
        let chunks = vec![paragraph(ChunkId::new_random(), 0, 0, 500)];
        let result = validate(&chunks, default_options());
        assert_eq!(result.oversized.len(), 1);
        // Oversizing is a Warning, not an Error, so is_valid still holds.
        assert!(result.is_valid);
    }

    #[test]
    fn out_of_order_sequence_numbers_are_flagged() {
        let chunks = vec![
            paragraph(ChunkId::new_random(), 5, 0, 10),
            paragraph(ChunkId::new_random(), 3, 0, 10),
        ];
        let result = validate(&chunks, default_options());
        assert!(!result.is_valid);
        assert!(result.issues.iter().any(|i| i.code == "SEQUENCE_NOT_MONOTONIC"));
    }

    #[test]
    fn depth_mismatch_is_flagged() {
        let mut chunk = paragraph(ChunkId::new_random(), 0, 3, 10);
        chunk.header.parent_id = None;
        let result = validate(&[chunk], default_options());
        assert!(!result.is_valid);
        assert!(result.has_invalid_hierarchy);
    }
}
