// src/spreadsheets/export_csv.rs
use crate::domain::csv_row::CSV_COLUMNS;
use crate::domain::lead::Lead;
use chrono::{DateTime, SecondsFormat, Utc};

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub(crate) fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The export columns of one lead, as text, in header order.
pub(crate) fn export_fields(lead: &Lead) -> [String; 16] {
    let f = &lead.fields;
    let opt_num = |n: Option<i64>| n.map(|n| n.to_string()).unwrap_or_default();
    [
        f.full_name.clone(),
        f.email.clone().unwrap_or_default(),
        f.phone.clone(),
        f.city.to_string(),
        f.property_type.to_string(),
        f.bhk.map(|b| b.to_string()).unwrap_or_default(),
        f.purpose.to_string(),
        opt_num(f.budget_min),
        opt_num(f.budget_max),
        f.timeline.to_string(),
        f.source.to_string(),
        f.notes.clone().unwrap_or_default(),
        f.tags.join(","),
        lead.status.to_string(),
        timestamp(&lead.created_at),
        timestamp(&lead.updated_at),
    ]
}

pub(crate) fn export_header() -> Vec<&'static str> {
    let mut header = CSV_COLUMNS.to_vec();
    header.extend(["createdAt", "updatedAt"]);
    header
}

/// Renders leads as CSV: a bare header line, then every field quoted.
pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut out = export_header().join(",");
    for lead in leads {
        out.push('\n');
        let row: Vec<String> = export_fields(lead).iter().map(|f| quote(f)).collect();
        out.push_str(&row.join(","));
    }
    out.push('\n');
    out
}
