// src/domain/csv_row.rs

use crate::domain::lead::{LeadStatus, NewLead};
use crate::domain::validation::{validate_create, FieldErrors, LeadInput, Typed};
use crate::errors::ServerError;
use serde::Serialize;
use serde_json::Value;

/// Hard ceiling on rows per import submission.
pub const MAX_BATCH_ROWS: usize = 200;

/// Column order shared by CSV import and export.
pub const CSV_COLUMNS: [&str; 14] = [
    "fullName",
    "email",
    "phone",
    "city",
    "propertyType",
    "bhk",
    "purpose",
    "budgetMin",
    "budgetMax",
    "timeline",
    "source",
    "notes",
    "tags",
    "status",
];

/// One imported row, every field still a plain string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvRow {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub bhk: String,
    pub purpose: String,
    pub budget_min: String,
    pub budget_max: String,
    pub timeline: String,
    pub source: String,
    pub notes: String,
    pub tags: String,
    pub status: String,
}

impl CsvRow {
    /// Sets a field by its CSV column name. Unknown columns are ignored.
    pub fn set(&mut self, column: &str, value: String) {
        let slot = match column {
            "fullName" => &mut self.full_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "city" => &mut self.city,
            "propertyType" => &mut self.property_type,
            "bhk" => &mut self.bhk,
            "purpose" => &mut self.purpose,
            "budgetMin" => &mut self.budget_min,
            "budgetMax" => &mut self.budget_max,
            "timeline" => &mut self.timeline,
            "source" => &mut self.source,
            "notes" => &mut self.notes,
            "tags" => &mut self.tags,
            "status" => &mut self.status,
            _ => return,
        };
        *slot = value;
    }

    /// Builds a row from positional values in `CSV_COLUMNS` order.
    pub fn from_positional(values: Vec<String>) -> Self {
        let mut row = CsvRow::default();
        for (column, value) in CSV_COLUMNS.iter().zip(values) {
            row.set(column, value);
        }
        row
    }

    /// Builds a row from one object of a bulk JSON import. Scalars are
    /// stringified; a `tags` array is joined with commas.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut row = CsvRow::default();
        for column in CSV_COLUMNS {
            let text = match obj.get(column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                Some(other) => other.to_string(),
            };
            row.set(column, text);
        }
        Some(row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Result of coercing a batch: rows that passed, and one error per row that
/// did not.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub valid: Vec<NewLead>,
    pub errors: Vec<RowError>,
}

fn optional(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn parse_budget(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<i64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    match t.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(field, "Expected number");
            None
        }
    }
}

/// Splits a comma-joined tag cell. An empty cell is an empty list.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Coerces a string row into lead input and applies the creation rules.
/// A blank status means New; any other status must be a known one and is
/// kept on the imported lead.
pub fn coerce_row(row: &CsvRow) -> Result<NewLead, FieldErrors> {
    let mut errors = FieldErrors::default();

    let budget_min = parse_budget(&mut errors, "budgetMin", &row.budget_min);
    let budget_max = parse_budget(&mut errors, "budgetMax", &row.budget_max);

    let status = match row.status.trim() {
        "" => Some(LeadStatus::New),
        s => match s.parse::<LeadStatus>() {
            Ok(st) => Some(st),
            Err(_) => {
                errors.push("status", format!("Invalid Status '{s}'"));
                None
            }
        },
    };

    let input = LeadInput {
        full_name: optional(&row.full_name),
        email: optional(&row.email),
        phone: optional(&row.phone),
        city: optional(&row.city),
        property_type: optional(&row.property_type),
        bhk: optional(&row.bhk),
        purpose: optional(&row.purpose),
        budget_min: budget_min.map(Typed::Value),
        budget_max: budget_max.map(Typed::Value),
        timeline: optional(&row.timeline),
        source: optional(&row.source),
        notes: optional(&row.notes),
        tags: Some(Typed::Value(split_tags(&row.tags))),
        status: None,
        updated_at: None,
    };

    match validate_create(&input) {
        Ok(lead) if errors.is_empty() => Ok(NewLead {
            status: status.unwrap_or_default(),
            ..lead
        }),
        Ok(_) => Err(errors),
        Err(found) => {
            for e in found.iter() {
                errors.push(&e.field, e.message.clone());
            }
            Err(errors)
        }
    }
}

/// Coerces every row independently. `first_row_number` is the number
/// reported for the first row (2 for a CSV file with a header line, 1 for a
/// JSON array). Batches over `MAX_BATCH_ROWS` are refused before any row is
/// looked at. A row that could not even be read arrives as `Err(message)`.
pub fn coerce_batch(
    rows: Vec<Result<CsvRow, String>>,
    first_row_number: usize,
) -> Result<BatchOutcome, ServerError> {
    if rows.len() > MAX_BATCH_ROWS {
        return Err(ServerError::BadRequest(format!(
            "Maximum {MAX_BATCH_ROWS} rows allowed"
        )));
    }

    let mut outcome = BatchOutcome::default();
    for (i, row) in rows.into_iter().enumerate() {
        let row_number = first_row_number + i;
        match row.and_then(|r| coerce_row(&r).map_err(|e| e.to_string())) {
            Ok(lead) => outcome.valid.push(lead),
            Err(message) => outcome.errors.push(RowError {
                row: row_number,
                message,
            }),
        }
    }
    Ok(outcome)
}
