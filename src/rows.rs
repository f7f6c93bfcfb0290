//! Tabular row data and the CSV codec.
//!
//! A [`RowSet`] is an ordered list of rows sharing one header, preserving the
//! source file's column order. The batch runner appends a `mockup_url`
//! column as rows complete, and the results download serializes the set back
//! out with RFC 4180 quoting.

use serde::{Deserialize, Serialize};

/// Column appended to every processed row holding the uploaded result URL.
pub const RESULT_COLUMN: &str = "mockup_url";

/// One data row: cell values in header order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
}

/// An ordered set of rows under a shared header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a cell by column name. Missing column or row → None.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.cells.get(col).map(String::as_str)
    }

    /// Set a cell by column name, adding the column to the header (and
    /// padding every row) if it does not exist yet.
    pub fn set_cell(&mut self, row: usize, column: &str, value: String) {
        let col = match self.headers.iter().position(|h| h == column) {
            Some(c) => c,
            None => {
                self.headers.push(column.to_string());
                self.headers.len() - 1
            }
        };
        if let Some(r) = self.rows.get_mut(row) {
            if r.cells.len() <= col {
                r.cells.resize(col + 1, String::new());
            }
            r.cells[col] = value;
        }
    }

    /// Parse CSV text with a first-row header.
    ///
    /// Handles quoted fields, embedded commas/newlines, and doubled quotes.
    /// Rows shorter than the header are padded with empty cells; longer rows
    /// are truncated to the header width.
    pub fn from_csv(input: &str) -> Self {
        let mut records = parse_csv(input);
        if records.is_empty() {
            return Self::default();
        }
        let headers = records.remove(0);
        let width = headers.len();
        let rows = records
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, String::new());
                Row { cells }
            })
            .collect();
        Self { headers, rows }
    }

    /// Serialize back to CSV, header first, quoting values that need it.
    /// Rows are padded to the header width so the output is rectangular.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, &self.headers);
        for row in &self.rows {
            let mut cells = row.cells.clone();
            cells.resize(self.headers.len(), String::new());
            write_record(&mut out, &cells);
        }
        out
    }
}

fn write_record(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Minimal RFC 4180 parser. CRLF and bare LF both terminate records.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    // Drop trailing fully-empty records from trailing newlines
    records.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    records
}
