//! Spec §8 "Boundary behaviors".

use doc_chunker::cancel::CancellationToken;
use doc_chunker::engine::chunk;
use doc_chunker::model::{ChunkBody, DocumentType};
use doc_chunker::options::ChunkingOptionsBuilder;

#[test]
fn empty_plain_text_input_succeeds_with_zero_chunks() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let result = chunk(&b""[..], DocumentType::PlainText, &options, &cancel).unwrap();
    assert!(result.success);
    assert!(result.chunks.is_empty());
}

#[test]
fn empty_markdown_input_succeeds_with_zero_chunks() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let result = chunk(&b""[..], DocumentType::Markdown, &options, &cancel).unwrap();
    assert!(result.success);
    assert!(result.chunks.is_empty());
}

#[test]
fn empty_csv_input_succeeds_with_zero_chunks() {
    // CSV never emits a root Document chunk for zero data rows: there is
    // nothing to describe (no delimiter was observed, no header resolved).
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let result = chunk(&b""[..], DocumentType::Csv, &options, &cancel).unwrap();
    assert!(result.success);
    assert!(result.chunks.is_empty());
}

#[test]
fn pure_prose_plain_text_is_all_content_all_roots() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let text = "Just an ordinary paragraph of prose with no headings, lists, or code in it at all.";
    let result = chunk(text.as_bytes(), DocumentType::PlainText, &options, &cancel).unwrap();

    assert!(!result.chunks.is_empty());
    for c in &result.chunks {
        assert!(matches!(c.body, ChunkBody::Paragraph(_)));
        assert_eq!(c.header.depth, 0);
        assert!(c.header.parent_id.is_none());
    }
}

#[test]
fn single_oversize_paragraph_splits_with_identical_parent_and_increasing_sequence() {
    let max_tokens = 30;
    let overlap = 5;
    let paragraph: String = (0..100)
        .map(|i| format!("token{i}"))
        .collect::<Vec<_>>()
        .join(" ");

    let options = ChunkingOptionsBuilder::new()
        .max_tokens(max_tokens)
        .overlap_tokens(overlap)
        .build();
    let cancel = CancellationToken::new();
    let result = chunk(paragraph.as_bytes(), DocumentType::PlainText, &options, &cancel).unwrap();

    let paragraphs: Vec<_> = result
        .chunks
        .iter()
        .filter(|c| matches!(c.body, ChunkBody::Paragraph(_)))
        .collect();
    assert!(paragraphs.len() > 1, "a 100-word paragraph at max_tokens=30 must split");

    let parent = paragraphs[0].header.parent_id;
    let mut last_sequence = None;
    for p in &paragraphs {
        assert_eq!(p.header.parent_id, parent);
        if let Some(last) = last_sequence {
            assert!(p.header.sequence_number > last);
        }
        last_sequence = Some(p.header.sequence_number);
    }
}
