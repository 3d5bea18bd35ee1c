//! Chunk a Markdown document and print each chunk's type and parent.
//!
//! Run with: `cargo run --example chunk_markdown`

use doc_chunker::cancel::CancellationToken;
use doc_chunker::engine::chunk;
use doc_chunker::model::DocumentType;
use doc_chunker::options::ChunkingOptionsBuilder;

fn main() {
    tracing_subscriber::fmt::init();

    let document = "\
# Getting Started

This engine turns a document into a flat list of typed, hierarchy-aware chunks.

## Installation

Add `doc-chunker` as a dependency and call `doc_chunker::engine::chunk_file`.
";

    let options = ChunkingOptionsBuilder::new()
        .max_tokens(256)
        .validate_chunks(true)
        .build();
    let cancel = CancellationToken::new();

    let result = chunk(document.as_bytes(), DocumentType::Markdown, &options, &cancel)
        .expect("markdown input is never rejected outright");

    println!("success: {}", result.success);
    println!("chunks: {}", result.statistics.total_chunks);
    for chunk in &result.chunks {
        println!(
            "  [{}] depth={} parent={:?} type={}",
            chunk.header.sequence_number,
            chunk.header.depth,
            chunk.header.parent_id,
            chunk.type_tag(),
        );
    }

    if let Some(validation) = &result.validation {
        println!("validation.is_valid: {}", validation.is_valid);
    }
    for warning in &result.warnings {
        println!("warning: {:?}: {}", warning.level, warning.message);
    }
}
