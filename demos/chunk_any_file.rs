//! Chunk any file on disk, resolving its format automatically, and print
//! aggregate statistics.
//!
//! Run with: `cargo run --example chunk_any_file -- path/to/document`

use doc_chunker::cancel::CancellationToken;
use doc_chunker::engine::chunk_file;
use doc_chunker::options::ChunkingOptionsBuilder;

fn main() {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: chunk_any_file <path>");
        std::process::exit(1);
    });

    let options = ChunkingOptionsBuilder::new()
        .max_tokens(512)
        .overlap_tokens(32)
        .build();
    let cancel = CancellationToken::new();

    match chunk_file(&path, &options, &cancel) {
        Ok(result) => {
            println!("success: {}", result.success);
            println!("total chunks: {}", result.statistics.total_chunks);
            println!("structural: {}", result.statistics.structural_count);
            println!("content: {}", result.statistics.content_count);
            println!("table: {}", result.statistics.table_count);
            println!("visual: {}", result.statistics.visual_count);
            println!("total tokens: {}", result.statistics.total_tokens);
            for warning in &result.warnings {
                println!("warning: {:?}: {}", warning.level, warning.message);
            }
        }
        Err(err) => {
            eprintln!("failed to chunk {path}: {err}");
            std::process::exit(1);
        }
    }
}
