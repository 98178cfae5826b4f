// src/auth/identity.rs
use crate::auth::sessions::{create_session, load_user_from_session, revoke_session};
use crate::config::SessionConfig;
use crate::db::users::{get_or_create_user, User};
use crate::domain::validation::is_valid_email;
use crate::errors::ServerError;
use astra::Request;
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

/// A freshly signed-in user and the raw token to put in their cookie.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
}

/// Trim + lowercase, then the same address check leads use.
pub fn normalize_email(email: &str) -> Result<String, ServerError> {
    let e = email.trim().to_lowercase();
    if !is_valid_email(&e) {
        return Err(ServerError::BadRequest("Invalid email address".into()));
    }
    Ok(e)
}

/// Email-only sign in: creates the user on first sight and opens a session.
pub fn sign_in(
    conn: &Connection,
    cfg: &SessionConfig,
    email: &str,
    name: Option<&str>,
    now: i64,
) -> Result<SignedIn, ServerError> {
    let email = normalize_email(email)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let user = get_or_create_user(conn, &email, name, Utc::now())?;
    let token = create_session(conn, &user.id, now, cfg.ttl_secs)?;
    info!(user_id = %user.id, "signed in");
    Ok(SignedIn { user, token })
}

pub fn sign_out(conn: &Connection, req: &Request, cfg: &SessionConfig, now: i64) -> Result<(), ServerError> {
    if let Some(token) = session_token(req, &cfg.cookie_name) {
        revoke_session(conn, &token, now)?;
    }
    Ok(())
}

/// Reads the session token out of the `Cookie` header.
pub fn session_token(req: &Request, cookie_name: &str) -> Option<String> {
    req.headers()
        .get_all("Cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == cookie_name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

/// The signed-in user for this request, if any.
pub fn current_user(
    conn: &Connection,
    req: &Request,
    cfg: &SessionConfig,
    now: i64,
) -> Result<Option<User>, ServerError> {
    match session_token(req, &cfg.cookie_name) {
        Some(token) => load_user_from_session(conn, &token, now),
        None => Ok(None),
    }
}

/// Like `current_user`, but a missing user is a 401.
pub fn require_user(
    conn: &Connection,
    req: &Request,
    cfg: &SessionConfig,
    now: i64,
) -> Result<User, ServerError> {
    current_user(conn, req, cfg, now)?
        .ok_or_else(|| ServerError::Unauthorized("Unauthorized".into()))
}

fn cookie_attrs(cfg: &SessionConfig) -> &'static str {
    if cfg.secure_cookie {
        "Path=/; HttpOnly; SameSite=Lax; Secure"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    }
}

pub fn session_cookie(cfg: &SessionConfig, token: &str) -> String {
    format!(
        "{}={token}; {}; Max-Age={}",
        cfg.cookie_name,
        cookie_attrs(cfg),
        cfg.ttl_secs
    )
}

pub fn clear_session_cookie(cfg: &SessionConfig) -> String {
    format!("{}=; {}; Max-Age=0", cfg.cookie_name, cookie_attrs(cfg))
}
