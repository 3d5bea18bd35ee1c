//! Spec §8 "Concrete scenarios": exact-shape assertions reproducing each
//! scenario directly against the public engine surface.

use doc_chunker::cancel::CancellationToken;
use doc_chunker::engine::chunk;
use doc_chunker::model::{ChunkBody, DocumentType};
use doc_chunker::options::ChunkingOptionsBuilder;
use doc_chunker::tokenizer::{build_counter, Encoding};

/// Scenario 1: Markdown hierarchy.
#[test]
fn markdown_hierarchy_scenario() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let text = "# A\n\npara1\n\n## B\n\npara2";
    let result = chunk(text.as_bytes(), DocumentType::Markdown, &options, &cancel).unwrap();

    assert_eq!(result.chunks.len(), 4);

    let a = &result.chunks[0];
    assert!(matches!(&a.body, ChunkBody::Section(s) if s.heading_text == "A" && s.heading_level == Some(1)));
    assert!(a.header.parent_id.is_none());
    assert_eq!(a.header.sequence_number, 0);

    let para1 = &result.chunks[1];
    assert!(matches!(&para1.body, ChunkBody::Paragraph(p) if p.content == "para1"));
    assert_eq!(para1.header.parent_id, Some(a.id()));
    assert_eq!(para1.header.sequence_number, 1);

    let b = &result.chunks[2];
    assert!(matches!(&b.body, ChunkBody::Section(s) if s.heading_text == "B" && s.heading_level == Some(2)));
    assert_eq!(b.header.parent_id, Some(a.id()));
    assert_eq!(b.header.sequence_number, 2);

    let para2 = &result.chunks[3];
    assert!(matches!(&para2.body, ChunkBody::Paragraph(p) if p.content == "para2"));
    assert_eq!(para2.header.parent_id, Some(b.id()));
    assert_eq!(para2.header.sequence_number, 3);
}

/// Scenario 2: CSV with header.
#[test]
fn csv_with_header_scenario() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let text = "Name,Age,City\nAlice,30,New York\nBob,25,London";
    let result = chunk(text.as_bytes(), DocumentType::Csv, &options, &cancel).unwrap();

    assert_eq!(result.chunks.len(), 3);

    let doc = &result.chunks[0];
    match &doc.body {
        ChunkBody::CsvDocument(csv) => {
            assert_eq!(csv.delimiter, ',');
            assert!(csv.has_header_row);
            assert_eq!(csv.row_count, 2);
            assert_eq!(csv.headers, vec!["Name", "Age", "City"]);
        }
        other => panic!("expected CsvDocument, got {other:?}"),
    }

    let row1 = &result.chunks[1];
    match &row1.body {
        ChunkBody::Row(row) => {
            assert_eq!(row.content, "Name: Alice, Age: 30, City: New York");
            assert_eq!(row.fields, vec!["Alice", "30", "New York"]);
        }
        other => panic!("expected Row, got {other:?}"),
    }
    assert_eq!(row1.header.parent_id, Some(doc.id()));
}

/// Scenario 3: CSV tab-delimited detection.
#[test]
fn csv_tab_delimited_detection_scenario() {
    let options = ChunkingOptionsBuilder::new().build();
    let cancel = CancellationToken::new();
    let text = "a\tb\tc\n1\t2\t3\n4\t5\t6";
    let result = chunk(text.as_bytes(), DocumentType::Csv, &options, &cancel).unwrap();

    let doc = result
        .chunks
        .iter()
        .find_map(|c| match &c.body {
            ChunkBody::CsvDocument(csv) => Some(csv),
            _ => None,
        })
        .expect("a CsvDocument chunk");
    assert_eq!(doc.delimiter, '\t');
}

/// Scenario 4: token budget splits, spec §8's own numbers (130 tokens,
/// `MaxTokens = 50`, `Overlap = 10`). Uses the `CharacterBased` counter so
/// the 130-token fixture is exact and deterministic (`CharacterBased` counts
/// `ceil(chars / 4)`, so 520 chars is exactly 130 tokens) rather than
/// dependent on `cl100k_base` BPE merges.
///
/// Spec §8 names 4 as the expected Paragraph count for this exact scenario,
/// but the real minimum window count covering 130 tokens with width 50 and
/// stride 40 is 3, not 4 — a literal 4th window's content would already be
/// a subset of the 3rd. This is a documented, deliberate deviation from the
/// spec's literal formula; see DESIGN.md's Open Questions and SPEC_FULL.md
/// §8 for the full derivation. The assertion below is the corrected,
/// independently-derived count (3), not a re-derivation of the splitter's
/// own stride arithmetic.
#[test]
fn token_budget_split_scenario() {
    let max_tokens = 50;
    let overlap = 10;
    const CHARS_PER_TOKEN: usize = 4;
    let total_tokens = 130;
    let paragraph = "x".repeat(total_tokens * CHARS_PER_TOKEN);

    let counter = build_counter(Encoding::CharacterBased).unwrap();
    assert_eq!(counter.count(&paragraph), total_tokens);

    let expected_batches = 3;

    let options = ChunkingOptionsBuilder::new()
        .max_tokens(max_tokens)
        .overlap_tokens(overlap)
        .token_counting_method(Encoding::CharacterBased)
        .build();
    let cancel = CancellationToken::new();
    let result = chunk(paragraph.as_bytes(), DocumentType::PlainText, &options, &cancel).unwrap();

    let paragraphs: Vec<_> = result
        .chunks
        .iter()
        .filter(|c| matches!(c.body, ChunkBody::Paragraph(_)))
        .collect();
    assert_eq!(paragraphs.len(), expected_batches);

    let parent = paragraphs[0].header.parent_id;
    for (i, p) in paragraphs.iter().enumerate() {
        assert_eq!(p.header.parent_id, parent);
        let metrics = p.header.quality_metrics.expect("paragraph carries metrics");
        assert!(metrics.token_count <= max_tokens);
        let is_last = i == paragraphs.len() - 1;
        assert_eq!(metrics.semantic_completeness >= 1.0, is_last);
    }

    let mut sequences: Vec<u64> = paragraphs.iter().map(|p| p.header.sequence_number).collect();
    let sorted = {
        let mut s = sequences.clone();
        s.sort();
        s
    };
    sequences.sort();
    assert_eq!(sequences, sorted);
}

/// Scenario 6: Validator cycle safety. The Hierarchy Builder can't be fed an
/// adversarial A→B→A pair directly through a `FormatChunker` (no chunker
/// emits cycles), so this drives `build_hierarchy`/`validate` directly, the
/// same components the engine wires together.
#[test]
fn validator_cycle_safety_scenario() {
    use doc_chunker::hierarchy::build_hierarchy;
    use doc_chunker::id::ChunkId;
    use doc_chunker::model::{ChunkHeader, ChunkMetadata, SectionChunk};
    use doc_chunker::validator::{validate, ValidationOptions};

    let a = ChunkId::new_random();
    let b = ChunkId::new_random();
    let metadata = ChunkMetadata::new(DocumentType::Markdown, "root");

    let mut header_a = ChunkHeader::new(a, 0, "Heading1", metadata.clone());
    header_a.parent_id = Some(b);
    let mut header_b = ChunkHeader::new(b, 1, "Heading1", metadata);
    header_b.parent_id = Some(a);

    let make = |header: ChunkHeader| {
        doc_chunker::model::Chunk::new(
            header,
            ChunkBody::Section(SectionChunk {
                heading_level: Some(1),
                heading_text: "H".to_string(),
                ..Default::default()
            }),
        )
    };
    let chunks = vec![make(header_a), make(header_b)];

    let report = build_hierarchy(chunks).unwrap();
    assert!(report.issues.iter().any(|i| i.code == "CIRCULAR_REFERENCE"));

    let options = ValidationOptions {
        max_tokens: 512,
        oversize_tolerance: 0,
        min_tokens: None,
    };
    let validation = validate(&report.chunks, options);
    assert!(!validation.is_valid);
    assert!(validation
        .issues
        .iter()
        .any(|i| i.code == "CIRCULAR_REFERENCE"));
}
