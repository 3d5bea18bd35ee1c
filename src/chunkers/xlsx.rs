//! XLSX Chunker (spec §4.11): one Worksheet (Structural) chunk per sheet,
//! its used range as a single Table chunk, and one Formula chunk per
//! formula-bearing cell. Embedded pictures/charts aren't exposed by
//! `calamine`'s read model, so Visual extraction is limited to what the
//! workbook's cell grid itself carries.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader, SheetVisible, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{next_header, ChunkerContext, FormatChunker};
use crate::error::ChunkingError;
use crate::model::{
    serialize_markdown_table, Chunk, ChunkBody, ChunkMetadata, DocumentType, FormulaChunk,
    SerializationFormat, TableChunk, TableInfo, WorksheetChunk,
};

#[derive(Default)]
pub struct XlsxChunker;

static CELL_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$?[A-Z]{1,3}\$?[0-9]+").unwrap());
static FORMULA_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=([A-Z]+)\(").unwrap());

impl FormatChunker for XlsxChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Xlsx
    }

    fn can_handle(&self, peek: &[u8]) -> bool {
        peek.starts_with(b"PK\x03\x04") && contains(peek, b"xl/")
    }

    fn chunk(&self, bytes: &[u8], ctx: &mut ChunkerContext<'_>) -> Result<Vec<Chunk>, ChunkingError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| ChunkingError::MalformedInput(format!("not a valid XLSX package: {e}")))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let hidden_sheets: HashSet<String> = workbook
            .sheets_metadata()
            .iter()
            .filter(|sheet| sheet.visible != SheetVisible::Visible)
            .map(|sheet| sheet.name.clone())
            .collect();
        let mut chunks = Vec::new();

        for (sheet_index, sheet_name) in sheet_names.into_iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ChunkingError::Cancelled);
            }
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let (row_count, column_count) = range.get_size();
            if row_count == 0 || column_count == 0 {
                continue;
            }

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            let has_header_row = looks_like_header(&rows[0]);

            let metadata = ChunkMetadata::new(DocumentType::Xlsx, sheet_name.clone())
                .with_sheet_name(sheet_name.clone());
            let header = next_header(ctx, "Worksheet", metadata);
            let sheet_id = header.id;
            chunks.push(Chunk::new(
                header,
                ChunkBody::Worksheet(WorksheetChunk {
                    sheet_name: sheet_name.clone(),
                    sheet_index,
                    row_count,
                    column_count,
                    is_hidden: hidden_sheets.contains(&sheet_name),
                    used_range: format!("A1:{}", cell_ref(row_count.saturating_sub(1), column_count.saturating_sub(1))),
                    ..Default::default()
                }),
            ));

            let (headers, data_rows) = if has_header_row {
                (rows[0].clone(), rows[1..].to_vec())
            } else {
                (Vec::new(), rows.clone())
            };
            let serialized = serialize_markdown_table(&headers, &data_rows);
            let table_info = TableInfo::new(data_rows.len(), column_count).with_headers(headers);
            let metadata = ChunkMetadata::new(DocumentType::Xlsx, format!("{sheet_name} data"))
                .with_sheet_name(sheet_name.clone());
            let table_header = next_header(ctx, "Table", metadata).with_parent(sheet_id);
            chunks.push(Chunk::new(
                table_header,
                ChunkBody::Table(TableChunk {
                    content: serialized.clone(),
                    serialized_table: serialized,
                    serialization_format: SerializationFormat::Markdown,
                    table_info,
                }),
            ));

            if let Ok(formulas) = workbook.worksheet_formula(&sheet_name) {
                for (r, row) in formulas.rows().enumerate() {
                    for (c, formula) in row.iter().enumerate() {
                        if formula.is_empty() {
                            continue;
                        }
                        let reference = cell_ref(r, c);
                        let referenced_cells: Vec<String> = CELL_REF
                            .find_iter(formula)
                            .map(|m| m.as_str().trim_start_matches('$').to_string())
                            .collect();
                        let calculated_value = rows
                            .get(r)
                            .and_then(|row| row.get(c))
                            .filter(|v| !v.is_empty())
                            .cloned();
                        let metadata = ChunkMetadata::new(DocumentType::Xlsx, format!("{sheet_name}!{reference}"))
                            .with_sheet_name(sheet_name.clone());
                        let f_header = next_header(ctx, "Formula", metadata).with_parent(sheet_id);
                        chunks.push(Chunk::new(
                            f_header,
                            ChunkBody::Formula(FormulaChunk {
                                content: formula.clone(),
                                cell_reference: reference,
                                formula: formula.clone(),
                                calculated_value,
                                formula_type: classify_formula(formula),
                                referenced_cells,
                                ..Default::default()
                            }),
                        ));
                    }
                }
            }
        }

        Ok(chunks)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn cell_to_string(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

/// `true` if at least 60% of `row`'s non-empty cells are non-numeric text
/// (spec §4.11 header-band heuristic).
fn looks_like_header(row: &[String]) -> bool {
    let non_empty: Vec<&String> = row.iter().filter(|c| !c.is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    let non_numeric = non_empty.iter().filter(|c| c.parse::<f64>().is_err()).count();
    non_numeric as f64 / non_empty.len() as f64 >= 0.6
}

/// The leading function name of a formula (spec §4.11 `FormulaType`),
/// matched anchored at the start via `^=([A-Z]+)\(` — a whitelisted name
/// appearing anywhere other than that leading position doesn't count.
fn classify_formula(formula: &str) -> Option<String> {
    let upper = formula.to_ascii_uppercase();
    FORMULA_TYPE_RE.captures(&upper).map(|c| c[1].to_string())
}

/// Zero-based `(row, col)` to an `A1`-style reference.
fn cell_ref(row: usize, col: usize) -> String {
    let mut col_label = String::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        col_label.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    format!("{col_label}{}", row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_ref_handles_single_and_double_letter_columns() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(0, 25), "Z1");
        assert_eq!(cell_ref(0, 26), "AA1");
    }

    #[test]
    fn header_row_detection_requires_mostly_text() {
        assert!(looks_like_header(&["Name".into(), "Age".into(), "City".into()]));
        assert!(!looks_like_header(&["1".into(), "2".into(), "3".into()]));
    }

    #[test]
    fn formula_classification_matches_known_functions() {
        assert_eq!(classify_formula("=SUM(A1:A10)"), Some("SUM".to_string()));
        assert_eq!(classify_formula("=A1+B1"), None);
    }

    #[test]
    fn formula_classification_is_not_limited_to_a_whitelist() {
        assert_eq!(classify_formula("=MYFUNC(A1)"), Some("MYFUNC".to_string()));
    }

    #[test]
    fn formula_classification_requires_leading_position() {
        // SUM appears in the formula but not as the leading function call.
        assert_eq!(classify_formula("=A1+SUM(B1:B2)"), None);
    }
}
