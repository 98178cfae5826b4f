// src/handlers/pages.rs
use crate::auth::identity::{clear_session_cookie, current_user, session_cookie, sign_in, sign_out};
use crate::db::lead_query::{list_leads, LeadFilter, PageRequest};
use crate::db::leads::{
    bulk_create_leads, create_lead, delete_lead, get_lead, list_lead_history, update_lead,
};
use crate::db::users::User;
use crate::domain::csv_row::{coerce_batch, split_tags, CSV_COLUMNS};
use crate::domain::lead::Lead;
use crate::domain::validation::{validate_create, validate_update, FieldErrors, LeadInput, Typed};
use crate::errors::ServerError;
use crate::handlers::api::DEFAULT_HISTORY_LIMIT;
use crate::rate_limit::{client_id, limit_key};
use crate::responses::{html_response, html_response_with_status, redirect, ResultResp};
use crate::router::{parse_query, path_segments, query_pairs, read_form, App};
use crate::spreadsheets::export_csv::export_fields;
use crate::spreadsheets::read_csv_rows;
use crate::templates::pages::{
    import_page, lead_detail_page, lead_form_page, leads_page, signin_page, ImportResult,
    LeadFormVm, LeadsVm,
};
use astra::{Body, Request, ResponseBuilder};
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;

const STYLESHEET: &str = include_str!("../../static/main.css");

const CONFLICT_NOTICE: &str =
    "This lead was changed by someone else after you opened it. Reload the form to see the latest version.";

pub fn route(req: Request, app: &App, peer: Option<SocketAddr>) -> ResultResp {
    let method = req.method().as_str().to_string();
    let segments = path_segments(&req);
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => redirect("/leads", None),
        ("GET", ["static", "main.css"]) => stylesheet(),
        ("GET", ["signin"]) => match signed_in(&req, app)? {
            Some(_) => redirect("/leads", None),
            None => html_response(signin_page(None)),
        },
        ("POST", ["auth", "signin"]) => form_sign_in(req, app),
        ("POST", ["auth", "signout"]) => form_sign_out(&req, app),
        (_, ["leads", rest @ ..]) => {
            let Some(user) = signed_in(&req, app)? else {
                return redirect("/signin", None);
            };
            match (method.as_str(), rest) {
                ("GET", []) => leads_list(&req, app, &user),
                ("GET", ["new"]) => new_lead_form(&user),
                ("POST", ["new"]) => create_from_form(req, app, &user, peer),
                ("GET", ["import"]) => html_response(import_page(&user.email, None, "")),
                ("POST", ["import"]) => import_from_form(req, app, &user),
                ("GET", [id]) => lead_detail(app, &user, id),
                ("GET", [id, "edit"]) => edit_form(app, &user, id),
                ("POST", [id, "edit"]) => update_from_form(req, app, &user, id),
                ("POST", [id, "delete"]) => delete_from_form(app, &user, id),
                _ => Err(ServerError::NotFound),
            }
        }
        _ => Err(ServerError::NotFound),
    }
}

fn stylesheet() -> ResultResp {
    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", mime::TEXT_CSS_UTF_8.as_ref())
        .header("Cache-Control", "public, max-age=3600")
        .body(Body::from(STYLESHEET))
        .map_err(|_| ServerError::InternalError)
}

fn signed_in(req: &Request, app: &App) -> Result<Option<User>, ServerError> {
    let now = Utc::now().timestamp();
    app.db
        .with_conn(|conn| current_user(conn, req, &app.session, now))
}

fn form_sign_in(mut req: Request, app: &App) -> ResultResp {
    let form = read_form(&mut req)?;
    let email = form.get("email").map(String::as_str).unwrap_or_default();
    let name = form.get("name").map(String::as_str);
    let now = Utc::now().timestamp();

    match app
        .db
        .with_conn(|conn| sign_in(conn, &app.session, email, name, now))
    {
        Ok(signed) => redirect("/leads", Some(session_cookie(&app.session, &signed.token))),
        Err(ServerError::BadRequest(msg)) => {
            html_response_with_status(400, signin_page(Some(&msg)))
        }
        Err(e) => Err(e),
    }
}

fn form_sign_out(req: &Request, app: &App) -> ResultResp {
    let now = Utc::now().timestamp();
    app.db
        .with_conn(|conn| sign_out(conn, req, &app.session, now))?;
    redirect("/signin", Some(clear_session_cookie(&app.session)))
}

fn leads_list(req: &Request, app: &App, user: &User) -> ResultResp {
    let params = parse_query(req);
    let filter = LeadFilter::from_params(&params)?;
    let paging = PageRequest::from_params(&params);
    let page = app
        .db
        .with_conn(|conn| list_leads(conn, &user.id, &filter, paging.page, paging.limit))?;
    let query = query_pairs(req);

    html_response(leads_page(&LeadsVm {
        email: &user.email,
        filter: &filter,
        page: &page,
        query: &query,
    }))
}

fn lead_detail(app: &App, user: &User, id: &str) -> ResultResp {
    let (lead, history) = app.db.with_conn(|conn| {
        let lead = get_lead(conn, id, &user.id)?.ok_or(ServerError::NotFound)?;
        let history =
            list_lead_history(conn, id, &user.id, DEFAULT_HISTORY_LIMIT)?.unwrap_or_default();
        Ok((lead, history))
    })?;
    html_response(lead_detail_page(&user.email, &lead, &history))
}

/// Form fields as lead input. Blank fields count as absent; a budget that
/// is not a whole number is reported against its field.
fn form_input(form: &HashMap<String, String>) -> LeadInput {
    let text = |name: &str| {
        form.get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let number = |name: &str| {
        text(name).map(|v| match v.parse::<i64>() {
            Ok(n) => Typed::Value(n),
            Err(_) => Typed::WrongType("Expected number"),
        })
    };

    LeadInput {
        full_name: text("fullName"),
        email: text("email"),
        phone: text("phone"),
        city: text("city"),
        property_type: text("propertyType"),
        bhk: text("bhk"),
        purpose: text("purpose"),
        budget_min: number("budgetMin"),
        budget_max: number("budgetMax"),
        timeline: text("timeline"),
        source: text("source"),
        notes: text("notes"),
        tags: Some(Typed::Value(split_tags(
            form.get("tags").map(String::as_str).unwrap_or_default(),
        ))),
        status: text("status"),
        updated_at: text("updatedAt"),
    }
}

/// A stored lead as form values, including its full-precision token.
fn lead_values(lead: &Lead) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = CSV_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .zip(export_fields(lead))
        .collect();
    values.insert(
        "updatedAt".into(),
        lead.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    );
    values
}

fn new_lead_form(user: &User) -> ResultResp {
    html_response(lead_form_page(&LeadFormVm {
        email: &user.email,
        title: "New lead",
        action: "/leads/new",
        values: &HashMap::new(),
        errors: None,
        notice: None,
        editing: false,
    }))
}

fn create_from_form(
    mut req: Request,
    app: &App,
    user: &User,
    peer: Option<SocketAddr>,
) -> ResultResp {
    let key = limit_key("create", &client_id(&req, peer, app.trust_forwarded_for));
    app.create_limiter.check(&key)?;

    let form = read_form(&mut req)?;
    match validate_create(&form_input(&form)) {
        Ok(lead) => {
            let stored = app
                .db
                .with_conn(|conn| create_lead(conn, &lead, &user.id, Utc::now()))?;
            redirect(&format!("/leads/{}", stored.id), None)
        }
        Err(errors) => html_response_with_status(
            400,
            lead_form_page(&LeadFormVm {
                email: &user.email,
                title: "New lead",
                action: "/leads/new",
                values: &form,
                errors: Some(&errors),
                notice: None,
                editing: false,
            }),
        ),
    }
}

fn edit_page(
    status: u16,
    user: &User,
    id: &str,
    values: &HashMap<String, String>,
    errors: Option<&FieldErrors>,
    notice: Option<&str>,
) -> ResultResp {
    let action = format!("/leads/{id}/edit");
    html_response_with_status(
        status,
        lead_form_page(&LeadFormVm {
            email: &user.email,
            title: "Edit lead",
            action: &action,
            values,
            errors,
            notice,
            editing: true,
        }),
    )
}

fn edit_form(app: &App, user: &User, id: &str) -> ResultResp {
    let lead = app
        .db
        .with_conn(|conn| get_lead(conn, id, &user.id))?
        .ok_or(ServerError::NotFound)?;
    edit_page(200, user, id, &lead_values(&lead), None, None)
}

fn update_from_form(mut req: Request, app: &App, user: &User, id: &str) -> ResultResp {
    let form = read_form(&mut req)?;
    let update = match validate_update(&form_input(&form)) {
        Ok(update) => update,
        Err(errors) => return edit_page(400, user, id, &form, Some(&errors), None),
    };

    match app
        .db
        .with_conn(|conn| update_lead(conn, id, &update, &user.id, Utc::now()))
    {
        Ok(_) => redirect(&format!("/leads/{id}"), None),
        // Keep what they typed; the stale token stays so a blind resubmit
        // conflicts again.
        Err(ServerError::Conflict) => edit_page(409, user, id, &form, None, Some(CONFLICT_NOTICE)),
        Err(e) => Err(e),
    }
}

fn delete_from_form(app: &App, user: &User, id: &str) -> ResultResp {
    if app.db.with_conn(|conn| delete_lead(conn, id, &user.id))? {
        redirect("/leads", None)
    } else {
        Err(ServerError::NotFound)
    }
}

fn import_from_form(mut req: Request, app: &App, user: &User) -> ResultResp {
    let form = read_form(&mut req)?;
    let csv = form.get("csv").map(String::as_str).unwrap_or_default();

    let outcome = match read_csv_rows(csv).and_then(|rows| coerce_batch(rows, 2)) {
        Ok(outcome) => outcome,
        Err(ServerError::BadRequest(message)) => {
            let result = ImportResult::Rejected {
                message: &message,
                errors: &[],
            };
            return html_response_with_status(400, import_page(&user.email, Some(&result), csv));
        }
        Err(e) => return Err(e),
    };

    if outcome.valid.is_empty() {
        let result = ImportResult::Rejected {
            message: "No valid rows to import",
            errors: &outcome.errors,
        };
        return html_response_with_status(400, import_page(&user.email, Some(&result), csv));
    }

    let created = app
        .db
        .with_conn(|conn| bulk_create_leads(conn, &outcome.valid, &user.id, Utc::now()))?;
    let result = ImportResult::Imported {
        count: created.len(),
        errors: &outcome.errors,
    };
    html_response(import_page(&user.email, Some(&result), ""))
}
