use crate::config::{Config, SessionConfig};
use crate::db::Database;
use crate::errors::ServerError;
use crate::handlers::{api, pages};
use crate::rate_limit::RequestLimiter;
use crate::responses::{api_error_response, ResultResp};
use astra::Request;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};
use url::form_urlencoded;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Everything a request handler needs, shared across worker threads.
#[derive(Debug)]
pub struct App {
    pub db: Database,
    pub create_limiter: RequestLimiter,
    pub trust_forwarded_for: bool,
    pub session: SessionConfig,
}

impl App {
    pub fn new(db: Database, config: &Config) -> Self {
        let limits = config.rate_limit();
        Self {
            db,
            create_limiter: RequestLimiter::new(limits.create_limit, limits.create_window),
            trust_forwarded_for: limits.trust_forwarded_for,
            session: config.session(),
        }
    }

    /// Default limits and session settings; used by tests.
    pub fn with_defaults(db: Database) -> Self {
        let limits = crate::config::RateLimitConfig::default();
        Self {
            db,
            create_limiter: RequestLimiter::new(limits.create_limit, limits.create_window),
            trust_forwarded_for: limits.trust_forwarded_for,
            session: SessionConfig::default(),
        }
    }
}

/// Routes one request. API errors are rendered as JSON here; page errors
/// are returned for the caller to render as HTML.
pub fn handle(req: Request, app: &App, peer: Option<SocketAddr>) -> ResultResp {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = if path.starts_with("/api/") {
        Ok(api::route(req, app, peer).unwrap_or_else(api_error_response))
    } else {
        pages::route(req, app, peer)
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(resp) => info!(
            %method,
            path = %path,
            status = resp.status().as_u16(),
            elapsed_ms,
            "request"
        ),
        Err(err) => warn!(
            %method,
            path = %path,
            status = err.status(),
            error = %err,
            elapsed_ms,
            "request failed"
        ),
    }
    result
}

/// Non-empty path segments: `/api/leads/42` -> `["api", "leads", "42"]`.
pub fn path_segments(req: &Request) -> Vec<String> {
    req.uri()
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decoded query-string pairs, in order.
pub fn query_pairs(req: &Request) -> Vec<(String, String)> {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Decoded query string; a repeated key keeps its last value.
pub fn parse_query(req: &Request) -> HashMap<String, String> {
    query_pairs(req).into_iter().collect()
}

/// Reads the whole body, refusing anything over `MAX_BODY_BYTES`.
pub fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let declared = req
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|n| n > MAX_BODY_BYTES) {
        return Err(ServerError::BadRequest("Request body too large".into()));
    }

    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_BODY_BYTES {
        return Err(ServerError::BadRequest("Request body too large".into()));
    }
    Ok(buf)
}

pub fn read_text(req: &mut Request) -> Result<String, ServerError> {
    String::from_utf8(read_body(req)?)
        .map_err(|_| ServerError::BadRequest("Request body must be UTF-8 text".into()))
}

pub fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let body = read_body(req)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::BadRequest("Request body is empty".into()));
    }
    Ok(serde_json::from_slice(&body)?)
}

/// `application/x-www-form-urlencoded` body as a map.
pub fn read_form(req: &mut Request) -> Result<HashMap<String, String>, ServerError> {
    let body = read_body(req)?;
    Ok(form_urlencoded::parse(&body).into_owned().collect())
}
