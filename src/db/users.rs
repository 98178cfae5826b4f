// src/db/users.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn row_to_user(r: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        email: r.get(1)?,
        name: r.get(2)?,
        created_at: r.get(3)?,
    })
}

/// Insert a user if they don't exist, then return the stored row.
/// Email should already be normalized by caller (trim/lowercase).
/// A name is only recorded when the user is first created.
pub fn get_or_create_user(
    conn: &Connection,
    email: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<User, ServerError> {
    conn.execute(
        "insert or ignore into users (id, email, name, created_at) values (?, ?, ?, ?)",
        params![Uuid::new_v4().to_string(), email, name, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert user failed: {e}")))?;

    conn.query_row(
        "select id, email, name, created_at from users where email = ?",
        params![email],
        row_to_user,
    )
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}
