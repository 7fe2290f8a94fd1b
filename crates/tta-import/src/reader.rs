use tta_core::SchemaError;

/// Minimal delimited-text reader for the import pipeline: comma separated,
/// double-quote escaping, CR/LF and LF line endings, blank lines skipped.
pub(crate) fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, SchemaError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush_row(&mut rows, &mut row, &mut field);
            }
            '\n' => flush_row(&mut rows, &mut row, &mut field),
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(SchemaError::MalformedCsv(
            "unterminated quoted field".to_string(),
        ));
    }
    flush_row(&mut rows, &mut row, &mut field);
    Ok(rows)
}

fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    // A line with no separators and no content is a blank line, not a record.
    if row.is_empty() && field.trim().is_empty() {
        field.clear();
        return;
    }
    row.push(std::mem::take(field));
    rows.push(std::mem::take(row));
}

/// Parsed file with the first row split off as the header contract.
pub(crate) struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub(crate) fn parse(text: &str) -> Result<Self, SchemaError> {
        let mut rows = parse_rows(text)?;
        if rows.is_empty() {
            return Err(SchemaError::MalformedCsv("missing header row".to_string()));
        }
        let headers = rows
            .remove(0)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { headers, rows })
    }

    pub(crate) fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Fatal whole-file check: every listed column must be present in the
    /// header row, order-independent.
    pub(crate) fn require_columns(&self, required: &[&str]) -> Result<(), SchemaError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|col| !self.headers.iter().any(|h| h == *col))
            .map(|col| (*col).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns { columns: missing })
        }
    }

    /// Data rows paired with their 1-based file row number (header is row 1).
    pub(crate) fn data_rows(&self) -> impl Iterator<Item = (usize, RowView<'_>)> {
        self.rows.iter().enumerate().map(|(i, fields)| {
            (
                i + 2,
                RowView {
                    headers: &self.headers,
                    fields,
                },
            )
        })
    }
}

pub(crate) struct RowView<'a> {
    headers: &'a [String],
    fields: &'a [String],
}

impl RowView<'_> {
    /// Trimmed cell under the named column; empty string when the column is
    /// absent or the row is short.
    pub(crate) fn get(&self, column: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.fields.get(i))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}
