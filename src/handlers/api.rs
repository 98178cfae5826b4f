// src/handlers/api.rs
//
// JSON API under /api. Every /api/leads route requires a session.

use crate::auth::identity::{clear_session_cookie, require_user, session_cookie, sign_in, sign_out};
use crate::db::lead_query::{export_leads, list_leads, LeadFilter, PageRequest};
use crate::db::leads::{
    bulk_create_leads, create_lead, delete_lead, get_lead, list_lead_history, update_lead,
};
use crate::db::users::User;
use crate::domain::csv_row::{coerce_batch, BatchOutcome, CsvRow};
use crate::domain::validation::{validate_create, validate_update, LeadInput};
use crate::errors::ServerError;
use crate::rate_limit::{client_id, limit_key};
use crate::responses::json::json_response_with_cookie;
use crate::responses::{csv_response, json_response, xlsx_response, ResultResp};
use crate::router::{parse_query, path_segments, read_json, read_text, App};
use crate::spreadsheets::{leads_to_csv, leads_to_xlsx, read_csv_rows};
use astra::Request;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::{info, warn};

pub const DEFAULT_HISTORY_LIMIT: u32 = 5;
const MAX_HISTORY_LIMIT: u32 = 100;

pub fn route(req: Request, app: &App, peer: Option<SocketAddr>) -> ResultResp {
    let method = req.method().as_str().to_string();
    let segments = path_segments(&req);
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["api", "auth", "signin"]) => api_sign_in(req, app),
        ("POST", ["api", "auth", "signout"]) => api_sign_out(&req, app),
        (_, ["api", "leads", rest @ ..]) => {
            let user = current(&req, app)?;
            match (method.as_str(), rest) {
                ("GET", []) => list(&req, app, &user),
                ("POST", []) => create(req, app, &user, peer),
                ("PUT", []) => bulk_import(req, app, &user),
                ("GET", ["export"]) => export_csv(&req, app, &user),
                ("GET", ["export.xlsx"]) => export_xlsx(&req, app, &user),
                ("POST", ["import"]) => csv_import(req, app, &user),
                ("GET", [id]) => get(app, &user, id),
                ("PUT", [id]) => update(req, app, &user, id),
                ("DELETE", [id]) => delete(app, &user, id),
                ("GET", [id, "history"]) => history(&req, app, &user, id),
                _ => Err(ServerError::NotFound),
            }
        }
        _ => Err(ServerError::NotFound),
    }
}

fn current(req: &Request, app: &App) -> Result<User, ServerError> {
    let now = Utc::now().timestamp();
    app.db
        .with_conn(|conn| require_user(conn, req, &app.session, now))
}

#[derive(Debug, Deserialize)]
struct SignInBody {
    email: String,
    name: Option<String>,
}

fn api_sign_in(mut req: Request, app: &App) -> ResultResp {
    let body: SignInBody = read_json(&mut req)?;
    let now = Utc::now().timestamp();
    let signed = app.db.with_conn(|conn| {
        sign_in(conn, &app.session, &body.email, body.name.as_deref(), now)
    })?;
    json_response_with_cookie(200, &signed.user, session_cookie(&app.session, &signed.token))
}

fn api_sign_out(req: &Request, app: &App) -> ResultResp {
    let now = Utc::now().timestamp();
    app.db
        .with_conn(|conn| sign_out(conn, req, &app.session, now))?;
    json_response_with_cookie(
        200,
        &json!({ "success": true }),
        clear_session_cookie(&app.session),
    )
}

fn list(req: &Request, app: &App, user: &User) -> ResultResp {
    let params = parse_query(req);
    let filter = LeadFilter::from_params(&params)?;
    let paging = PageRequest::from_params(&params);
    let page = app
        .db
        .with_conn(|conn| list_leads(conn, &user.id, &filter, paging.page, paging.limit))?;
    json_response(200, &page)
}

fn create(mut req: Request, app: &App, user: &User, peer: Option<SocketAddr>) -> ResultResp {
    let key = limit_key("create", &client_id(&req, peer, app.trust_forwarded_for));
    app.create_limiter.check(&key)?;

    let input: LeadInput = read_json(&mut req)?;
    let lead = validate_create(&input).map_err(ServerError::Validation)?;
    let stored = app
        .db
        .with_conn(|conn| create_lead(conn, &lead, &user.id, Utc::now()))?;
    json_response(201, &stored)
}

fn get(app: &App, user: &User, id: &str) -> ResultResp {
    let lead = app
        .db
        .with_conn(|conn| get_lead(conn, id, &user.id))?
        .ok_or(ServerError::NotFound)?;
    json_response(200, &lead)
}

fn update(mut req: Request, app: &App, user: &User, id: &str) -> ResultResp {
    let input: LeadInput = read_json(&mut req)?;
    let update = validate_update(&input).map_err(ServerError::Validation)?;
    let updated = app
        .db
        .with_conn(|conn| update_lead(conn, id, &update, &user.id, Utc::now()))?;
    json_response(200, &updated)
}

fn delete(app: &App, user: &User, id: &str) -> ResultResp {
    if app.db.with_conn(|conn| delete_lead(conn, id, &user.id))? {
        json_response(200, &json!({ "success": true }))
    } else {
        Err(ServerError::NotFound)
    }
}

fn history(req: &Request, app: &App, user: &User, id: &str) -> ResultResp {
    let limit = parse_query(req)
        .get("limit")
        .and_then(|l| l.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let entries = app
        .db
        .with_conn(|conn| list_lead_history(conn, id, &user.id, limit))?
        .ok_or(ServerError::NotFound)?;
    json_response(200, &entries)
}

fn export_filename(ext: &str) -> String {
    format!("leads-{}.{ext}", Utc::now().format("%Y-%m-%d"))
}

fn export_csv(req: &Request, app: &App, user: &User) -> ResultResp {
    let filter = LeadFilter::from_params(&parse_query(req))?;
    let leads = app
        .db
        .with_conn(|conn| export_leads(conn, &user.id, &filter))?;
    info!(user_id = %user.id, rows = leads.len(), "csv export");
    csv_response(leads_to_csv(&leads), &export_filename("csv"))
}

fn export_xlsx(req: &Request, app: &App, user: &User) -> ResultResp {
    let filter = LeadFilter::from_params(&parse_query(req))?;
    let leads = app
        .db
        .with_conn(|conn| export_leads(conn, &user.id, &filter))?;
    info!(user_id = %user.id, rows = leads.len(), "xlsx export");
    xlsx_response(leads_to_xlsx(&leads)?, &export_filename("xlsx"))
}

/// `PUT /api/leads` with `{"leads": [...]}`; rows are numbered from 1.
fn bulk_import(mut req: Request, app: &App, user: &User) -> ResultResp {
    let body: Value = read_json(&mut req)?;
    let rows = match body.get("leads").and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => rows,
        _ => return Err(ServerError::BadRequest("Invalid data format".into())),
    };

    let rows = rows
        .iter()
        .map(|v| CsvRow::from_json(v).ok_or_else(|| "Invalid data".to_string()))
        .collect();
    finish_import(app, user, coerce_batch(rows, 1)?)
}

/// `POST /api/leads/import` with CSV text; the header is row 1.
fn csv_import(mut req: Request, app: &App, user: &User) -> ResultResp {
    let text = read_text(&mut req)?;
    let rows = read_csv_rows(&text)?;
    finish_import(app, user, coerce_batch(rows, 2)?)
}

fn finish_import(app: &App, user: &User, outcome: BatchOutcome) -> ResultResp {
    let BatchOutcome { valid, errors } = outcome;
    if !errors.is_empty() {
        warn!(user_id = %user.id, rejected = errors.len(), "import rows rejected");
    }
    if valid.is_empty() {
        return json_response(
            400,
            &json!({ "error": "No valid rows to import", "errors": errors }),
        );
    }

    let created = app
        .db
        .with_conn(|conn| bulk_create_leads(conn, &valid, &user.id, Utc::now()))?;
    json_response(
        200,
        &json!({ "success": true, "imported": created.len(), "errors": errors }),
    )
}
