// src/domain/changes.rs

use crate::domain::lead::Lead;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const CREATED_MARKER: &str = "Record created";
pub const IMPORTED_MARKER: &str = "Record created via CSV import";

/// The before/after pair for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Field name -> change. Empty means nothing changed.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// One immutable audit entry for a lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub lead_id: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub diff: ChangeSet,
}

/// The single synthetic change written when a lead is first stored.
pub fn created_entry(marker: &str) -> ChangeSet {
    let mut changes = ChangeSet::new();
    changes.insert(
        "created".to_string(),
        FieldChange {
            old: Value::Null,
            new: Value::String(marker.to_string()),
        },
    );
    changes
}

/// Compares every user-editable field of two versions of a lead. System
/// fields (id, owner, timestamps) are never part of the diff.
pub fn diff(existing: &Lead, incoming: &Lead) -> ChangeSet {
    let mut changes = ChangeSet::new();
    let (a, b) = (&existing.fields, &incoming.fields);

    macro_rules! compare {
        ($name:literal, $old:expr, $new:expr) => {
            if $old != $new {
                changes.insert(
                    $name.to_string(),
                    FieldChange {
                        old: json!($old),
                        new: json!($new),
                    },
                );
            }
        };
    }

    compare!("fullName", a.full_name, b.full_name);
    compare!("email", a.email, b.email);
    compare!("phone", a.phone, b.phone);
    compare!("city", a.city, b.city);
    compare!("propertyType", a.property_type, b.property_type);
    compare!("bhk", a.bhk, b.bhk);
    compare!("purpose", a.purpose, b.purpose);
    compare!("budgetMin", a.budget_min, b.budget_min);
    compare!("budgetMax", a.budget_max, b.budget_max);
    compare!("timeline", a.timeline, b.timeline);
    compare!("source", a.source, b.source);
    compare!("notes", a.notes, b.notes);
    compare!("tags", a.tags, b.tags);
    compare!("status", existing.status, incoming.status);

    changes
}
