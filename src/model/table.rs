//! Tabular-region metadata shared by the `Table` chunk category (spec §3.1).

use serde::{Deserialize, Serialize};

/// How a table's body has been serialized into [`crate::model::chunk::TableChunk::serialized_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializationFormat {
    Markdown,
    Csv,
    Json,
    Html,
}

impl Default for SerializationFormat {
    fn default() -> Self {
        SerializationFormat::Markdown
    }
}

/// Shape metadata for a tabular region, shared by `Table` and `Row` chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableInfo {
    pub row_count: usize,
    pub column_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    pub has_header_row: bool,
    pub has_merged_cells: bool,
    pub preferred_format: SerializationFormat,
}

impl TableInfo {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            headers: Vec::new(),
            has_header_row: false,
            has_merged_cells: false,
            preferred_format: SerializationFormat::Markdown,
        }
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.has_header_row = !headers.is_empty();
        self.headers = headers;
        self
    }

    pub fn with_merged_cells(mut self, merged: bool) -> Self {
        self.has_merged_cells = merged;
        self
    }

    pub fn with_preferred_format(mut self, format: SerializationFormat) -> Self {
        self.preferred_format = format;
        self
    }
}

/// Serialize a rectangular grid of cell strings as a GitHub-flavored Markdown
/// table. `headers` is used as the header row when non-empty; otherwise the
/// first data row doubles as an (unlabeled) header so the table still
/// renders, matching how `SerializedTable` is always populated (spec §3.1).
pub fn serialize_markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let column_count = headers
        .len()
        .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));
    if column_count == 0 {
        return out;
    }

    let header_cells: Vec<String> = if headers.is_empty() {
        (0..column_count).map(|i| format!("Column{}", i + 1)).collect()
    } else {
        let mut h = headers.to_vec();
        h.resize(column_count, String::new());
        h
    };

    out.push_str(&render_row(&header_cells));
    out.push('\n');
    out.push_str(&render_separator(column_count));
    out.push('\n');
    for row in rows {
        let mut r = row.clone();
        r.resize(column_count, String::new());
        out.push_str(&render_row(&r));
        out.push('\n');
    }
    out
}

fn render_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells
        .iter()
        .map(|c| c.replace('\\', "\\\\").replace('|', "\\|").replace('\n', " "))
        .collect();
    format!("| {} |", escaped.join(" | "))
}

fn render_separator(column_count: usize) -> String {
    let cells = vec!["---".to_string(); column_count];
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_rows() {
        let headers = vec!["Name".to_string(), "Age".to_string()];
        let rows = vec![vec!["Alice".to_string(), "30".to_string()]];
        let md = serialize_markdown_table(&headers, &rows);
        assert_eq!(md, "| Name | Age |\n| --- | --- |\n| Alice | 30 |\n");
    }

    #[test]
    fn escapes_pipes_in_cells() {
        let headers = vec!["A".to_string()];
        let rows = vec![vec!["x|y".to_string()]];
        let md = serialize_markdown_table(&headers, &rows);
        assert!(md.contains("x\\|y"));
    }
}
