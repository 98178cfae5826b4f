// src/spreadsheets/import_csv.rs
use crate::domain::csv_row::{CsvRow, CSV_COLUMNS};
use crate::errors::ServerError;

/// Splits CSV text into records. Fields may be bare or double-quoted; inside
/// quotes, `""` is a literal quote and commas or newlines are kept. Both
/// `\n` and `\r\n` end a record.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, ServerError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ServerError::BadRequest("Unterminated quoted field in CSV".into()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

fn is_blank(record: &[String]) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Reads an import file into rows for coercion. The first non-blank line is
/// the header: when it names known columns, fields are mapped by name,
/// otherwise by position. Blank lines are dropped.
pub fn read_csv_rows(text: &str) -> Result<Vec<Result<CsvRow, String>>, ServerError> {
    let mut records = parse_records(text)?
        .into_iter()
        .filter(|r| !is_blank(r));

    let header = records
        .next()
        .ok_or_else(|| ServerError::BadRequest("CSV file is empty".into()))?;
    let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    let by_name = header.iter().any(|h| CSV_COLUMNS.contains(&h.as_str()));
    let width = if by_name { header.len() } else { CSV_COLUMNS.len() };

    Ok(records
        .map(|record| {
            if record.len() > width {
                return Err(format!(
                    "Expected at most {width} columns, found {}",
                    record.len()
                ));
            }
            let values = record.into_iter().map(|v| v.trim().to_string());
            if by_name {
                let mut row = CsvRow::default();
                for (column, value) in header.iter().zip(values) {
                    row.set(column, value);
                }
                Ok(row)
            } else {
                Ok(CsvRow::from_positional(values.collect()))
            }
        })
        .collect())
}
