//! CSV Chunker (spec §4.12): delimiter sniffing, RFC 4180 streaming parse,
//! one `CsvDocument` (Structural) chunk plus one `Row` (Table) chunk per
//! data row.

use super::{next_header, ChunkerContext, FormatChunker};
use crate::error::ChunkingError;
use crate::model::{
    serialize_markdown_table, Chunk, ChunkBody, ChunkMetadata, CsvDocumentChunk, DocumentType,
    RowChunk, SerializationFormat, TableInfo,
};
use crate::result::ChunkingWarning;

#[derive(Default)]
pub struct CsvChunker;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

impl FormatChunker for CsvChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Csv
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        let text = String::from_utf8_lossy(peek);
        let sample: Vec<&str> = text.lines().take(5).collect();
        !sample.is_empty() && CANDIDATE_DELIMITERS.iter().any(|d| score_delimiter(&sample, *d as char) > 0.0)
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let text = String::from_utf8_lossy(bytes);
        let sample: Vec<&str> = text.lines().take(5).collect();
        let delimiter = detect_delimiter(&sample);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        // Keep each record's starting byte offset so `RawRow` can be sliced
        // verbatim out of the original input rather than rejoined from
        // parsed fields (spec step 6 "RawRow = exact source line").
        let mut raw_rows: Vec<(csv::StringRecord, u64)> = Vec::new();
        for result in reader.records() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            match result {
                Ok(record) => {
                    let offset = record.position().map(|p| p.byte()).unwrap_or(0);
                    raw_rows.push((record, offset));
                }
                Err(err) => {
                    ctx.warnings.push(ChunkingWarning::warning(format!(
                        "SKIPPED_MALFORMED_ROW: {err}"
                    )));
                }
            }
        }

        if raw_rows.is_empty() {
            return Ok(Vec::new());
        }

        let first_row: Vec<String> = raw_rows[0].0.iter().map(str::to_string).collect();
        let has_header_row = looks_like_header(&first_row);
        let (headers, data_rows) = if has_header_row {
            (first_row, &raw_rows[1..])
        } else {
            (Vec::new(), &raw_rows[..])
        };
        let column_count = headers
            .len()
            .max(data_rows.iter().map(|(r, _)| r.len()).max().unwrap_or(0));

        let metadata = ChunkMetadata::new(DocumentType::Csv, "document");
        let doc_header = next_header(ctx, "CsvDocument", metadata);
        let doc_id = doc_header.id;
        let mut chunks = vec![Chunk::new(
            doc_header,
            ChunkBody::CsvDocument(CsvDocumentChunk {
                delimiter,
                row_count: data_rows.len(),
                column_count,
                has_header_row,
                headers: headers.clone(),
                encoding: "utf-8".to_string(),
                ..Default::default()
            }),
        )];

        for (i, (record, offset)) in data_rows.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            if has_header_row && record.len() != headers.len() {
                ctx.warnings.push(ChunkingWarning::warning(format!(
                    "SKIPPED_MALFORMED_ROW: expected {} fields, found {}",
                    headers.len(),
                    record.len()
                )));
                continue;
            }

            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            let next_offset = data_rows
                .get(i + 1)
                .map(|(_, o)| *o)
                .unwrap_or(bytes.len() as u64);
            let raw_row = raw_line(bytes, *offset, next_offset);
            let has_quoted_fields = raw_row.contains('"');

            let content = format_row_content(&headers, &fields);
            let serialized = serialize_markdown_table(&headers, std::slice::from_ref(&fields));
            let table_info = TableInfo::new(1, fields.len()).with_headers(headers.clone());
            let metadata = ChunkMetadata::new(DocumentType::Csv, "row");
            let row_header = next_header(ctx, "Row", metadata).with_parent(doc_id);
            chunks.push(Chunk::new(
                row_header,
                ChunkBody::Row(RowChunk {
                    content,
                    serialized_table: serialized,
                    serialization_format: SerializationFormat::Markdown,
                    table_info,
                    fields,
                    raw_row: Some(raw_row),
                    has_quoted_fields: Some(has_quoted_fields),
                }),
            ));
        }

        Ok(chunks)
    }
}

/// `"<h1>: <f1>, <h2>: <f2>, …"` when headers exist, else `"<f1>, <f2>, …"`
/// (spec §4.12 step 6 `Content`), pairing only up to `min(fields, headers)`.
fn format_row_content(headers: &[String], fields: &[String]) -> String {
    if headers.is_empty() {
        return fields.join(", ");
    }
    let n = fields.len().min(headers.len());
    (0..n)
        .map(|i| format!("{}: {}", headers[i], fields[i]))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The exact source bytes for one record, trimmed of its trailing line
/// ending, recovered by byte offset rather than rejoined from parsed fields
/// so embedded delimiters/quoting survive verbatim.
fn raw_line(bytes: &[u8], start: u64, end: u64) -> String {
    let start = start as usize;
    let end = (end as usize).min(bytes.len());
    let slice = if start <= end { &bytes[start..end] } else { &[] };
    String::from_utf8_lossy(slice)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

fn detect_delimiter(sample: &[&str]) -> char {
    CANDIDATE_DELIMITERS
        .iter()
        .map(|d| (*d as char, score_delimiter(sample, *d as char)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(d, _)| d)
        .unwrap_or(',')
}

/// Score a candidate delimiter by how consistently it splits `sample`'s
/// lines into the same field count (spec §4.12 delimiter detection).
fn score_delimiter(sample: &[&str], delimiter: char) -> f64 {
    let counts: Vec<usize> = sample.iter().map(|line| line.matches(delimiter).count()).collect();
    if counts.iter().all(|c| *c == 0) {
        return 0.0;
    }
    let first = counts[0];
    if first == 0 {
        return 0.0;
    }
    let consistent = counts.iter().filter(|c| **c == first).count();
    consistent as f64 / counts.len() as f64 * first as f64
}

/// `true` if at least 70% of the first row's cells are non-numeric (spec
/// §4.12 header detection).
fn looks_like_header(row: &[String]) -> bool {
    let non_empty: Vec<&String> = row.iter().filter(|c| !c.trim().is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    let non_numeric = non_empty.iter().filter(|c| c.trim().parse::<f64>().is_err()).count();
    non_numeric as f64 / non_empty.len() as f64 >= 0.7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_delimiter_is_detected_for_comma_data() {
        let sample = vec!["a,b,c", "1,2,3", "4,5,6"];
        assert_eq!(detect_delimiter(&sample), ',');
    }

    #[test]
    fn tab_delimiter_is_detected_for_tsv_data() {
        let sample = vec!["a\tb\tc", "1\t2\t3"];
        assert_eq!(detect_delimiter(&sample), '\t');
    }

    #[test]
    fn header_row_requires_mostly_non_numeric_cells() {
        assert!(looks_like_header(&["Name".into(), "Age".into()]));
        assert!(!looks_like_header(&["1".into(), "2".into()]));
    }

    #[test]
    fn content_pairs_headers_with_fields() {
        let headers = vec!["Name".to_string(), "Age".to_string(), "City".to_string()];
        let fields = vec!["Alice".to_string(), "30".to_string(), "New York".to_string()];
        assert_eq!(
            format_row_content(&headers, &fields),
            "Name: Alice, Age: 30, City: New York"
        );
    }

    #[test]
    fn content_falls_back_to_bare_fields_without_headers() {
        let fields = vec!["a".to_string(), "b".to_string()];
        assert_eq!(format_row_content(&[], &fields), "a, b");
    }

    #[test]
    fn raw_line_trims_trailing_newline() {
        let bytes = b"a,b,c\nd,e,f\n";
        assert_eq!(raw_line(bytes, 0, 6), "a,b,c");
        assert_eq!(raw_line(bytes, 6, 12), "d,e,f");
    }
}
