use crate::errors::ServerError;
use crate::router::handle;
use crate::templates::html_error_response;
use crate::tests::utils::{body_json, body_string, create, lead_json, sign_in, test_app, Call};
use astra::Body;
use http::{Method, Request};

#[test]
fn signin_page_loads() {
    let t = test_app();
    let resp = Call::new(Method::GET, "/signin").send(&t);
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Sign in"));
    assert!(body.contains("action=\"/auth/signin\""));
}

#[test]
fn form_sign_in_redirects_with_cookie() {
    let t = test_app();
    let resp = Call::new(Method::POST, "/auth/signin")
        .form("email=agent%40example.com&name=Agent")
        .send(&t);
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["Location"], "/leads");

    let cookie = resp.headers()["Set-Cookie"].to_str().unwrap();
    let cookie = cookie.split(';').next().unwrap().to_string();
    let resp = Call::new(Method::GET, "/leads").cookie(&cookie).send(&t);
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("agent@example.com"));
}

#[test]
fn form_sign_in_with_bad_email_rerenders_form() {
    let t = test_app();
    let resp = Call::new(Method::POST, "/auth/signin")
        .form("email=nope")
        .send(&t);
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("Invalid email address"));
}

#[test]
fn pages_redirect_to_signin_without_session() {
    let t = test_app();
    for uri in ["/leads", "/leads/abc"] {
        let resp = Call::new(Method::GET, uri).send(&t);
        assert_eq!(resp.status(), 303, "{uri}");
        assert_eq!(resp.headers()["Location"], "/signin");
    }
}

#[test]
fn list_and_detail_pages_show_leads() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));

    let list = body_string(
        Call::new(Method::GET, "/leads?search=john")
            .cookie(&cookie)
            .send(&t),
    );
    assert!(list.contains("John Doe"));
    assert!(list.contains("1 leads"));

    let id = lead["id"].as_str().unwrap();
    let detail = body_string(Call::new(Method::GET, format!("/leads/{id}")).cookie(&cookie).send(&t));
    assert!(detail.contains("Recent changes"));
    assert!(detail.contains("Record created"));
}

#[test]
fn unknown_lead_page_is_404() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let req = Request::builder()
        .method(Method::GET)
        .uri("/leads/does-not-exist")
        .header("Cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    let err = match handle(req, &t.app, None) {
        Err(err) => err,
        Ok(resp) => panic!("expected an error, got {}", resp.status()),
    };
    assert!(matches!(err, ServerError::NotFound));

    let resp = html_error_response(err);
    assert_eq!(resp.status(), 404);
    assert!(body_string(resp).contains("Error 404"));
}

fn encode(pairs: &[(&str, &str)]) -> String {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    form.extend_pairs(pairs);
    form.finish()
}

const PLOT_FORM: [(&str, &str); 7] = [
    ("fullName", "Jane Doe"),
    ("phone", "9876543210"),
    ("city", "Mohali"),
    ("propertyType", "Plot"),
    ("purpose", "Buy"),
    ("timeline", "0-3m"),
    ("source", "Website"),
];

#[test]
fn stylesheet_is_served() {
    let t = test_app();
    let resp = Call::new(Method::GET, "/static/main.css").send(&t);
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["Content-Type"], "text/css; charset=utf-8");
    assert!(body_string(resp).contains("--accent"));
}

#[test]
fn new_lead_form_shows_field_errors_then_creates() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let resp = Call::new(Method::GET, "/leads/new").cookie(&cookie).send(&t);
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("action=\"/leads/new\""));

    let mut bad = PLOT_FORM.to_vec();
    bad[1] = ("phone", "123");
    bad.push(("budgetMin", "lots"));
    let resp = Call::new(Method::POST, "/leads/new")
        .cookie(&cookie)
        .form(&encode(&bad))
        .send(&t);
    assert_eq!(resp.status(), 400);
    let body = body_string(resp);
    assert!(body.contains("Phone must be 10-15 digits"));
    assert!(body.contains("Expected number"));
    assert!(body.contains("value=\"Jane Doe\""));

    let resp = Call::new(Method::POST, "/leads/new")
        .cookie(&cookie)
        .form(&encode(&PLOT_FORM))
        .send(&t);
    assert_eq!(resp.status(), 303);
    let location = resp.headers()["Location"].to_str().unwrap().to_string();
    assert!(location.starts_with("/leads/"));

    let detail = body_string(Call::new(Method::GET, location).cookie(&cookie).send(&t));
    assert!(detail.contains("Jane Doe"));
    assert!(detail.contains("Record created"));
}

#[test]
fn edit_form_posts_token_and_reports_conflicts() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));
    let id = lead["id"].as_str().unwrap();
    let token = lead["updatedAt"].as_str().unwrap();
    let uri = format!("/leads/{id}/edit");

    let form_page = body_string(Call::new(Method::GET, uri.as_str()).cookie(&cookie).send(&t));
    assert!(form_page.contains("name=\"updatedAt\""));
    assert!(form_page.contains("value=\"John Doe\""));

    let mut edit = PLOT_FORM.to_vec();
    edit[0] = ("fullName", "John Renamed");
    edit.push(("status", "Contacted"));
    edit.push(("updatedAt", token));
    let body = encode(&edit);

    let resp = Call::new(Method::POST, uri.as_str())
        .cookie(&cookie)
        .form(&body)
        .send(&t);
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["Location"], format!("/leads/{id}").as_str());

    // Same token again: someone else already saved.
    let resp = Call::new(Method::POST, uri.as_str())
        .cookie(&cookie)
        .form(&body)
        .send(&t);
    assert_eq!(resp.status(), 409);
    assert!(body_string(resp).contains("changed by someone else"));

    let stored = body_json(
        Call::new(Method::GET, format!("/api/leads/{id}"))
            .cookie(&cookie)
            .send(&t),
    );
    assert_eq!(stored["fullName"], "John Renamed");
    assert_eq!(stored["status"], "Contacted");
}

#[test]
fn delete_form_removes_the_lead() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));
    let id = lead["id"].as_str().unwrap();

    let resp = Call::new(Method::POST, format!("/leads/{id}/delete"))
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["Location"], "/leads");

    let resp = Call::new(Method::GET, format!("/api/leads/{id}"))
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 404);
}

#[test]
fn import_form_reports_imported_and_skipped_rows() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let csv = "fullName,phone,city,propertyType,bhk,purpose,timeline,source\n\
               Jane Doe,9876543210,Mohali,Plot,,Buy,0-3m,Website\n\
               X,1,Delhi,Plot,,Buy,0-3m,Website\n";
    let resp = Call::new(Method::POST, "/leads/import")
        .cookie(&cookie)
        .form(&encode(&[("csv", csv)]))
        .send(&t);
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    assert!(body.contains("Imported 1 leads."));
    assert!(body.contains("<td>3</td>"));

    let resp = Call::new(Method::POST, "/leads/import")
        .cookie(&cookie)
        .form(&encode(&[("csv", "")]))
        .send(&t);
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("CSV file is empty"));
}
