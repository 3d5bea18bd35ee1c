//! Aggregate statistics over a finished chunk list (spec §4.4 "Statistics").

use crate::model::{Chunk, ChunkCategory};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Statistics {
    pub total_chunks: usize,
    pub structural_count: usize,
    pub content_count: usize,
    pub visual_count: usize,
    pub table_count: usize,
    pub max_depth: usize,
    pub processing_time: Duration,
    pub total_tokens: u64,
    pub avg_tokens: f64,
    pub min_tokens: u64,
    pub max_tokens: u64,
    /// Count of chunks per `SpecificType` tag.
    pub specific_type_distribution: HashMap<String, usize>,
}

/// Compute statistics over the final chunk list (spec I8: per-category
/// counts must sum to `total_chunks`).
pub fn compute_statistics(chunks: &[Chunk], processing_time: Duration) -> Statistics {
    let mut structural_count = 0;
    let mut content_count = 0;
    let mut visual_count = 0;
    let mut table_count = 0;
    let mut max_depth = 0;
    let mut token_counts = Vec::new();
    let mut specific_type_distribution: HashMap<String, usize> = HashMap::new();

    for chunk in chunks {
        match chunk.category() {
            ChunkCategory::Structural => structural_count += 1,
            ChunkCategory::Content => content_count += 1,
            ChunkCategory::Visual => visual_count += 1,
            ChunkCategory::Table => table_count += 1,
        }
        max_depth = max_depth.max(chunk.header.depth);
        if let Some(metrics) = &chunk.header.quality_metrics {
            token_counts.push(metrics.token_count as u64);
        }
        *specific_type_distribution
            .entry(chunk.header.specific_type.clone())
            .or_insert(0) += 1;
    }

    let total_tokens: u64 = token_counts.iter().sum();
    let avg_tokens = if token_counts.is_empty() {
        0.0
    } else {
        total_tokens as f64 / token_counts.len() as f64
    };
    let min_tokens = token_counts.iter().copied().min().unwrap_or(0);
    let max_tokens = token_counts.iter().copied().max().unwrap_or(0);

    Statistics {
        total_chunks: chunks.len(),
        structural_count,
        content_count,
        visual_count,
        table_count,
        max_depth,
        processing_time,
        total_tokens,
        avg_tokens,
        min_tokens,
        max_tokens,
        specific_type_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ChunkId;
    use crate::model::{
        ChunkBody, ChunkHeader, ChunkMetadata, DocumentType, ParagraphChunk, QualityMetrics,
        SectionChunk,
    };

    #[test]
    fn category_counts_sum_to_total() {
        let metadata = ChunkMetadata::new(DocumentType::Markdown, "root");
        let section = Chunk::new(
            ChunkHeader::new(ChunkId::new_random(), 0, "Heading1", metadata.clone()),
            ChunkBody::Section(SectionChunk {
                heading_level: Some(1),
                heading_text: "H".into(),
                ..Default::default()
            }),
        );
        let paragraph = Chunk::new(
            ChunkHeader::new(ChunkId::new_random(), 1, "Paragraph", metadata)
                .with_quality_metrics(QualityMetrics::for_text("hi", 5)),
            ChunkBody::Paragraph(ParagraphChunk {
                content: "hi".into(),
                ..Default::default()
            }),
        );
        let stats = compute_statistics(&[section, paragraph], Duration::from_millis(1));
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(
            stats.structural_count + stats.content_count + stats.visual_count + stats.table_count,
            stats.total_chunks
        );
        assert_eq!(stats.total_tokens, 5);
        assert_eq!(stats.avg_tokens, 5.0);
    }
}
