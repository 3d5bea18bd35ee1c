//! Spec §8 "Round-trip and idempotence laws".

use doc_chunker::cancel::CancellationToken;
use doc_chunker::engine::chunk;
use doc_chunker::model::{Chunk, DocumentType};
use doc_chunker::options::ChunkingOptionsBuilder;
use doc_chunker::tokenizer::{build_counter, Encoding};

fn markdown_sample() -> &'static str {
    "# Title\n\nFirst paragraph.\n\n## Sub\n\n- one\n- two\n\n```rust\nfn main() {}\n```\n"
}

#[test]
fn serialize_deserialize_serialize_is_stable() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let result = chunk(
        markdown_sample().as_bytes(),
        DocumentType::Markdown,
        &options,
        &cancel,
    )
    .unwrap();

    let first = serde_json::to_value(&result.chunks).unwrap();
    let restored: Vec<Chunk> = serde_json::from_value(first.clone()).unwrap();
    let second = serde_json::to_value(&restored).unwrap();
    assert_eq!(first, second);
}

#[test]
fn deserialized_chunks_preserve_ids_and_hierarchy() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let result = chunk(
        markdown_sample().as_bytes(),
        DocumentType::Markdown,
        &options,
        &cancel,
    )
    .unwrap();

    let json = serde_json::to_value(&result.chunks).unwrap();
    let restored: Vec<Chunk> = serde_json::from_value(json).unwrap();

    assert_eq!(restored.len(), result.chunks.len());
    for (original, restored) in result.chunks.iter().zip(restored.iter()) {
        assert_eq!(original.id(), restored.id());
        assert_eq!(original.parent_id(), restored.parent_id());
        assert_eq!(original.header.depth, restored.header.depth);
        assert_eq!(original.type_tag(), restored.type_tag());
    }
}

#[test]
fn csv_raw_row_reparses_to_the_same_fields() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let text = "Name,Age\n\"Doe, Jane\",41\nBob,25";
    let result = chunk(text.as_bytes(), DocumentType::Csv, &options, &cancel).unwrap();

    for c in &result.chunks {
        if let doc_chunker::model::ChunkBody::Row(row) = &c.body {
            let raw_row = row.raw_row.as_ref().expect("row carries its raw source line");
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(raw_row.as_bytes());
            let record = reader
                .records()
                .next()
                .expect("raw_row reparses to exactly one record")
                .unwrap();
            let reparsed: Vec<String> = record.iter().map(str::to_string).collect();
            assert_eq!(reparsed, row.fields);
        }
    }
}

#[test]
fn token_counter_join_without_overlap_preserves_total_count() {
    let counter = build_counter(Encoding::Cl100k).unwrap();
    let text: String = (0..60).map(|i| format!("lexeme{i}")).collect::<Vec<_>>().join(" ");
    let total = counter.count(&text);
    assert!(total > 20);

    let batches = counter.split_batches(&text, 20, 0).unwrap();
    // With zero overlap, batches are disjoint and their concatenation covers
    // every original token exactly once.
    let joined_count: usize = batches.iter().map(|b| counter.count(b)).sum();
    assert_eq!(joined_count, total);
}
