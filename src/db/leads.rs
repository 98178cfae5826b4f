// src/db/leads.rs
//
// Persistence for leads and their change history. Every read and write is
// scoped by owner id; a lead owned by someone else is indistinguishable from
// one that does not exist.

use crate::domain::changes::{
    created_entry, diff, ChangeSet, HistoryEntry, CREATED_MARKER, IMPORTED_MARKER,
};
use crate::domain::lead::{Lead, LeadFields, LeadUpdate, NewLead};
use crate::errors::ServerError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{info, warn};
use uuid::Uuid;

/// Column list matching `row_to_lead`.
pub(crate) const LEAD_COLUMNS: &str = "id, full_name, email, phone, city, property_type, bhk, \
     purpose, budget_min, budget_max, timeline, source, status, notes, tags, owner_id, \
     created_at, updated_at";

pub(crate) fn row_to_lead(row: &Row<'_>) -> rusqlite::Result<Lead> {
    let tags_json: String = row.get(14)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e)))?;

    Ok(Lead {
        id: row.get(0)?,
        fields: LeadFields {
            full_name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            city: row.get(4)?,
            property_type: row.get(5)?,
            bhk: row.get(6)?,
            purpose: row.get(7)?,
            budget_min: row.get(8)?,
            budget_max: row.get(9)?,
            timeline: row.get(10)?,
            source: row.get(11)?,
            notes: row.get(13)?,
            tags,
        },
        status: row.get(12)?,
        owner_id: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn tags_to_json(tags: &[String]) -> Result<String, ServerError> {
    serde_json::to_string(tags).map_err(|e| ServerError::DbError(format!("encode tags failed: {e}")))
}

/// The next version token. Always differs from `previous`, even when the
/// clock has not moved (or moved backwards) since the last write.
fn next_token(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn insert_lead(
    conn: &Connection,
    lead: &NewLead,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    let stored = Lead {
        id: Uuid::new_v4().to_string(),
        fields: lead.fields.clone(),
        status: lead.status,
        owner_id: owner_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    let f = &stored.fields;

    conn.execute(
        r#"
        INSERT INTO leads (
            id, full_name, email, phone, city, property_type, bhk, purpose,
            budget_min, budget_max, timeline, source, status, notes, tags,
            owner_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
        params![
            &stored.id,
            &f.full_name,
            &f.email,
            &f.phone,
            f.city,
            f.property_type,
            f.bhk,
            f.purpose,
            f.budget_min,
            f.budget_max,
            f.timeline,
            f.source,
            stored.status,
            &f.notes,
            tags_to_json(&f.tags)?,
            &stored.owner_id,
            stored.created_at,
            stored.updated_at,
        ],
    )?;

    Ok(stored)
}

fn insert_history(
    conn: &Connection,
    lead_id: &str,
    changed_by: &str,
    changed_at: DateTime<Utc>,
    changes: &ChangeSet,
) -> Result<(), ServerError> {
    let diff_json = serde_json::to_string(changes)
        .map_err(|e| ServerError::DbError(format!("encode diff failed: {e}")))?;
    conn.execute(
        r#"
        INSERT INTO lead_history (id, lead_id, changed_by, changed_at, diff)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            Uuid::new_v4().to_string(),
            lead_id,
            changed_by,
            changed_at,
            diff_json
        ],
    )?;
    Ok(())
}

/// Stores a new lead and its "created" history entry in one transaction.
pub fn create_lead(
    conn: &mut Connection,
    lead: &NewLead,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    let tx = conn.transaction()?;
    let stored = insert_lead(&tx, lead, owner_id, now)?;
    insert_history(&tx, &stored.id, owner_id, now, &created_entry(CREATED_MARKER))?;
    tx.commit()?;

    info!(lead_id = %stored.id, owner_id, "lead created");
    Ok(stored)
}

/// Fetches a lead if, and only if, it belongs to `owner_id`.
pub fn get_lead(conn: &Connection, id: &str, owner_id: &str) -> Result<Option<Lead>, ServerError> {
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1 AND owner_id = ?2");
    Ok(conn
        .query_row(&sql, params![id, owner_id], row_to_lead)
        .optional()?)
}

/// Overwrites the stored row with `updated`, but only while its token still
/// equals `expected`. Zero rows matched means someone else wrote first.
fn write_update(
    conn: &Connection,
    updated: &Lead,
    expected: DateTime<Utc>,
) -> Result<(), ServerError> {
    let f = &updated.fields;
    let written = conn.execute(
        r#"
        UPDATE leads SET
            full_name = ?1, email = ?2, phone = ?3, city = ?4, property_type = ?5,
            bhk = ?6, purpose = ?7, budget_min = ?8, budget_max = ?9, timeline = ?10,
            source = ?11, status = ?12, notes = ?13, tags = ?14, updated_at = ?15
        WHERE id = ?16 AND owner_id = ?17 AND updated_at = ?18
        "#,
        params![
            &f.full_name,
            &f.email,
            &f.phone,
            f.city,
            f.property_type,
            f.bhk,
            f.purpose,
            f.budget_min,
            f.budget_max,
            f.timeline,
            f.source,
            updated.status,
            &f.notes,
            tags_to_json(&f.tags)?,
            updated.updated_at,
            &updated.id,
            &updated.owner_id,
            expected,
        ],
    )?;
    if written == 0 {
        warn!(lead_id = %updated.id, "lead changed underneath update");
        return Err(ServerError::Conflict);
    }
    Ok(())
}

/// Applies a validated update under optimistic concurrency.
///
/// The stored `updated_at` must equal the caller's token exactly, otherwise
/// `Conflict` is returned and nothing is written. The write itself is
/// conditioned on the same token, so a writer in another process that slips
/// in between also surfaces as `Conflict`. A history entry is written only
/// when at least one field actually changed; the token is refreshed either way.
pub fn update_lead(
    conn: &mut Connection,
    id: &str,
    update: &LeadUpdate,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing = get_lead(&tx, id, owner_id)?.ok_or(ServerError::NotFound)?;
    if existing.updated_at != update.expected_updated_at {
        warn!(lead_id = id, "stale updatedAt token, refusing update");
        return Err(ServerError::Conflict);
    }

    let updated = Lead {
        fields: update.fields.clone(),
        status: update.status.unwrap_or(existing.status),
        updated_at: next_token(existing.updated_at, now),
        ..existing.clone()
    };
    write_update(&tx, &updated, update.expected_updated_at)?;

    let changes = diff(&existing, &updated);
    if !changes.is_empty() {
        insert_history(&tx, id, owner_id, now, &changes)?;
    }
    tx.commit()?;

    info!(lead_id = id, changed = changes.len(), "lead updated");
    Ok(updated)
}

/// Deletes a lead owned by `owner_id`. Its history goes with it through the
/// foreign-key cascade. Returns whether a row was removed.
pub fn delete_lead(conn: &Connection, id: &str, owner_id: &str) -> Result<bool, ServerError> {
    let removed = conn.execute(
        "DELETE FROM leads WHERE id = ?1 AND owner_id = ?2",
        params![id, owner_id],
    )?;
    if removed > 0 {
        info!(lead_id = id, owner_id, "lead deleted");
    }
    Ok(removed > 0)
}

/// Inserts already-validated leads in a single transaction: either every
/// lead and its history entry is committed, or none is.
pub fn bulk_create_leads(
    conn: &mut Connection,
    leads: &[NewLead],
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Lead>, ServerError> {
    let tx = conn.transaction()?;
    let created = created_entry(IMPORTED_MARKER);

    let mut stored = Vec::with_capacity(leads.len());
    for lead in leads {
        let row = insert_lead(&tx, lead, owner_id, now)?;
        insert_history(&tx, &row.id, owner_id, now, &created)?;
        stored.push(row);
    }
    tx.commit()?;

    info!(owner_id, count = stored.len(), "leads imported");
    Ok(stored)
}

/// Most recent history entries for a lead, newest first. `None` when the
/// lead is not visible to `owner_id`.
pub fn list_lead_history(
    conn: &Connection,
    lead_id: &str,
    owner_id: &str,
    limit: u32,
) -> Result<Option<Vec<HistoryEntry>>, ServerError> {
    if get_lead(conn, lead_id, owner_id)?.is_none() {
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT id, lead_id, changed_by, changed_at, diff
        FROM lead_history
        WHERE lead_id = ?1
        ORDER BY changed_at DESC, rowid DESC
        LIMIT ?2
        "#,
    )?;
    let rows = stmt.query_map(params![lead_id, limit], |row| {
        let diff_json: String = row.get(4)?;
        let diff: ChangeSet = serde_json::from_str(&diff_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(HistoryEntry {
            id: row.get(0)?,
            lead_id: row.get(1)?,
            changed_by: row.get(2)?,
            changed_at: row.get(3)?,
            diff,
        })
    })?;

    let mut entries = Vec::new();
    for entry in rows {
        entries.push(entry?);
    }
    Ok(Some(entries))
}
