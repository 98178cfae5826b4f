use crate::db::connection::{init_db, Database};
use crate::router::{handle, App};
use astra::{Body, Response};
use http::{Method, Request};
use serde_json::{json, Value};
use std::io::Read;
use tempfile::TempDir;

/// An app over its own throwaway database; the directory goes away on drop.
pub struct TestApp {
    pub app: App,
    _dir: TempDir,
}

/// Initialize a fresh test DB using the production schema
pub fn test_app() -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("leads.sqlite3");
    let db = Database::new(path.to_string_lossy().into_owned());

    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestApp {
        app: App::with_defaults(db),
        _dir: dir,
    }
}

pub struct Call<'a> {
    method: Method,
    uri: String,
    cookie: Option<&'a str>,
    headers: Vec<(&'static str, String)>,
    body: Option<(&'static str, Vec<u8>)>,
}

impl<'a> Call<'a> {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            cookie: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn cookie(mut self, cookie: &'a str) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json(mut self, value: &Value) -> Self {
        self.body = Some(("application/json", value.to_string().into_bytes()));
        self
    }

    pub fn csv(mut self, text: &str) -> Self {
        self.body = Some(("text/csv", text.as_bytes().to_vec()));
        self
    }

    pub fn form(mut self, encoded: &str) -> Self {
        self.body = Some((
            "application/x-www-form-urlencoded",
            encoded.as_bytes().to_vec(),
        ));
        self
    }

    pub fn send(self, t: &TestApp) -> Response {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(cookie) = self.cookie {
            builder = builder.header("Cookie", cookie);
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let body = match self.body {
            Some((content_type, bytes)) => {
                builder = builder.header("Content-Type", content_type);
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        handle(builder.body(body).unwrap(), &t.app, None).expect("Failed to handle request")
    }
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp)).unwrap()
}

/// Signs in through the API and returns a `Cookie` header value.
pub fn sign_in(t: &TestApp, email: &str) -> String {
    let resp = Call::new(Method::POST, "/api/auth/signin")
        .json(&json!({ "email": email }))
        .send(t);
    assert_eq!(resp.status(), 200);
    let set_cookie = resp.headers()["Set-Cookie"].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// A valid create payload.
pub fn lead_json(name: &str) -> Value {
    json!({
        "fullName": name,
        "email": "john@example.com",
        "phone": "9876543210",
        "city": "Chandigarh",
        "propertyType": "Apartment",
        "bhk": "2",
        "purpose": "Buy",
        "budgetMin": 5000000,
        "budgetMax": 8000000,
        "timeline": "3-6m",
        "source": "Website",
        "notes": "Looking for 2BHK",
        "tags": ["premium", "apartment"]
    })
}

/// Creates a lead through the API and returns the stored record.
pub fn create(t: &TestApp, cookie: &str, body: &Value) -> Value {
    let resp = Call::new(Method::POST, "/api/leads")
        .cookie(cookie)
        .json(body)
        .send(t);
    assert_eq!(resp.status(), 201);
    body_json(resp)
}
