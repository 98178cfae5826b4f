// src/db/lead_query.rs
//
// Filtered, sorted, paginated reads over an owner's leads.

use crate::db::leads::{row_to_lead, LEAD_COLUMNS};
use crate::domain::lead::{City, Lead, LeadStatus, PropertyType, Timeline};
use crate::errors::ServerError;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const EXPORT_ROW_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    UpdatedAt,
    CreatedAt,
    FullName,
    BudgetMin,
    BudgetMax,
}

impl SortKey {
    /// Unknown keys fall back to the default sort.
    pub fn parse(s: &str) -> Self {
        match s {
            "createdAt" => SortKey::CreatedAt,
            "fullName" => SortKey::FullName,
            "budgetMin" => SortKey::BudgetMin,
            "budgetMax" => SortKey::BudgetMax,
            _ => SortKey::UpdatedAt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::UpdatedAt => "updatedAt",
            SortKey::CreatedAt => "createdAt",
            SortKey::FullName => "fullName",
            SortKey::BudgetMin => "budgetMin",
            SortKey::BudgetMax => "budgetMax",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortKey::UpdatedAt => "updated_at",
            SortKey::CreatedAt => "created_at",
            SortKey::FullName => "full_name COLLATE NOCASE",
            SortKey::BudgetMin => "budget_min",
            SortKey::BudgetMax => "budget_max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters for listing and export. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub city: Option<City>,
    pub property_type: Option<PropertyType>,
    pub status: Option<LeadStatus>,
    pub timeline: Option<Timeline>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

fn enum_param<T: FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ServerError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ServerError::BadRequest(format!("Invalid {key} filter '{v}'"))),
    }
}

impl LeadFilter {
    /// Builds a filter from decoded query-string pairs. Blank values are
    /// ignored; an unknown enum value is a 400.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        Ok(Self {
            search: params
                .get("search")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            city: enum_param(params, "city")?,
            property_type: enum_param(params, "propertyType")?,
            status: enum_param(params, "status")?,
            timeline: enum_param(params, "timeline")?,
            sort_by: params.get("sortBy").map(|s| SortKey::parse(s)).unwrap_or_default(),
            sort_order: params
                .get("sortOrder")
                .map(|s| SortOrder::parse(s))
                .unwrap_or_default(),
        })
    }
}

/// Page and page size as requested over HTTP, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: NonZeroU32,
}

impl PageRequest {
    /// `page >= 1`, `1 <= limit <= 100`; unparsable values take the defaults.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let page = params
            .get("page")
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX)) as u32;
        let limit = params
            .get("limit")
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
        Self {
            page,
            limit: NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    pub items: Vec<Lead>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// WHERE clause and its positional parameters, owner scope first.
fn where_clause(owner_id: &str, filter: &LeadFilter) -> (String, Vec<SqlValue>) {
    let mut clauses = vec!["owner_id = ?".to_string()];
    let mut values = vec![SqlValue::Text(owner_id.to_string())];

    if let Some(term) = &filter.search {
        clauses.push(
            "(full_name LIKE ? ESCAPE '\\' OR phone LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = like_pattern(term);
        for _ in 0..3 {
            values.push(SqlValue::Text(pattern.clone()));
        }
    }

    let exact = [
        ("city", filter.city.map(|v| v.as_str())),
        ("property_type", filter.property_type.map(|v| v.as_str())),
        ("status", filter.status.map(|v| v.as_str())),
        ("timeline", filter.timeline.map(|v| v.as_str())),
    ];
    for (column, value) in exact {
        if let Some(value) = value {
            clauses.push(format!("{column} = ?"));
            values.push(SqlValue::Text(value.to_string()));
        }
    }

    (clauses.join(" AND "), values)
}

fn order_clause(filter: &LeadFilter) -> String {
    let dir = filter.sort_order.sql();
    format!("{} {dir}, rowid {dir}", filter.sort_by.column())
}

fn select_leads(
    conn: &Connection,
    where_sql: &str,
    mut values: Vec<SqlValue>,
    filter: &LeadFilter,
    limit: u32,
    offset: u64,
) -> Result<Vec<Lead>, ServerError> {
    let sql = format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        order_clause(filter)
    );
    debug!(%sql, "listing leads");
    values.push(SqlValue::Integer(i64::from(limit)));
    values.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_lead)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// One page of an owner's leads. Pages are 1-indexed; a page past the end
/// is simply empty.
pub fn list_leads(
    conn: &Connection,
    owner_id: &str,
    filter: &LeadFilter,
    page: u32,
    limit: NonZeroU32,
) -> Result<LeadPage, ServerError> {
    let page = page.max(1);
    let limit = limit.get();
    let (where_sql, values) = where_clause(owner_id, filter);

    let total_count: i64 = conn.query_row(
        &format!("SELECT count(*) FROM leads WHERE {where_sql}"),
        params_from_iter(values.iter()),
        |r| r.get(0),
    )?;
    let total_count = total_count.max(0) as u64;

    let offset = u64::from(page - 1) * u64::from(limit);
    let items = select_leads(conn, &where_sql, values, filter, limit, offset)?;

    Ok(LeadPage {
        items,
        total_count,
        total_pages: total_count.div_ceil(u64::from(limit)),
        current_page: page,
    })
}

/// Every lead matching `filter`, in list order, capped at `EXPORT_ROW_LIMIT`.
pub fn export_leads(
    conn: &Connection,
    owner_id: &str,
    filter: &LeadFilter,
) -> Result<Vec<Lead>, ServerError> {
    let (where_sql, values) = where_clause(owner_id, filter);
    select_leads(conn, &where_sql, values, filter, EXPORT_ROW_LIMIT, 0)
}
