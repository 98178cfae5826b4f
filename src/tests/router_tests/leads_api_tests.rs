use crate::tests::utils::{body_json, create, lead_json, sign_in, test_app, Call};
use http::Method;
use serde_json::json;

#[test]
fn create_returns_201_with_new_status_and_one_history_entry() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let lead = create(&t, &cookie, &lead_json("John Doe"));
    assert_eq!(lead["status"], "New");
    assert_eq!(lead["fullName"], "John Doe");
    assert_eq!(lead["tags"], json!(["premium", "apartment"]));
    assert_eq!(lead["createdAt"], lead["updatedAt"]);

    let resp = Call::new(Method::GET, format!("/api/leads/{}/history", lead["id"].as_str().unwrap()))
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 200);
    let history = body_json(resp);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(
        history[0]["diff"],
        json!({ "created": { "old": null, "new": "Record created" } })
    );
}

#[test]
fn validation_errors_are_field_scoped() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let mut body = lead_json("John Doe");
    body["bhk"] = json!(null);
    body["budgetMin"] = json!(9000000);
    let resp = Call::new(Method::POST, "/api/leads")
        .cookie(&cookie)
        .json(&body)
        .send(&t);
    assert_eq!(resp.status(), 400);

    let err = body_json(resp);
    assert_eq!(err["error"], "Validation error");
    let details = err["details"].as_array().unwrap();
    assert!(details.contains(&json!({
        "field": "bhk",
        "message": "BHK is required for Apartment and Villa properties"
    })));
    assert!(details.contains(&json!({
        "field": "budgetMax",
        "message": "Maximum budget must be greater than or equal to minimum budget"
    })));
}

#[test]
fn wrong_typed_fields_are_reported_with_the_rest() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let mut body = lead_json("J");
    body["budgetMin"] = json!("5000000");
    body["tags"] = json!("a,b");
    let resp = Call::new(Method::POST, "/api/leads")
        .cookie(&cookie)
        .json(&body)
        .send(&t);
    assert_eq!(resp.status(), 400);

    let err = body_json(resp);
    assert_eq!(err["error"], "Validation error");
    assert_eq!(
        err["details"],
        json!([
            { "field": "fullName", "message": "Full name must be at least 2 characters" },
            { "field": "budgetMin", "message": "Expected number" },
            { "field": "tags", "message": "Expected array" }
        ])
    );
}

#[test]
fn malformed_json_is_400() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let resp = Call::new(Method::POST, "/api/leads")
        .cookie(&cookie)
        .csv("{not json")
        .send(&t);
    assert_eq!(resp.status(), 400);
}

#[test]
fn update_with_current_token_succeeds_and_stale_token_conflicts() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));
    let uri = format!("/api/leads/{}", lead["id"].as_str().unwrap());

    let mut edit = lead_json("John Doe");
    edit["status"] = json!("Contacted");
    edit["updatedAt"] = lead["updatedAt"].clone();
    let resp = Call::new(Method::PUT, &uri).cookie(&cookie).json(&edit).send(&t);
    assert_eq!(resp.status(), 200);
    let updated = body_json(resp);
    assert_eq!(updated["status"], "Contacted");
    assert_ne!(updated["updatedAt"], lead["updatedAt"]);

    // Replaying the old token must not overwrite the newer record.
    edit["status"] = json!("Dropped");
    let resp = Call::new(Method::PUT, &uri).cookie(&cookie).json(&edit).send(&t);
    assert_eq!(resp.status(), 409);
    assert_eq!(
        body_json(resp)["error"],
        "Record has been modified by another user. Please refresh and try again."
    );

    let current = body_json(Call::new(Method::GET, &uri).cookie(&cookie).send(&t));
    assert_eq!(current["status"], "Contacted");

    let history = body_json(
        Call::new(Method::GET, format!("{uri}/history"))
            .cookie(&cookie)
            .send(&t),
    );
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(
        history[0]["diff"]["status"],
        json!({ "old": "New", "new": "Contacted" })
    );
}

#[test]
fn update_requires_a_token() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));

    let resp = Call::new(Method::PUT, format!("/api/leads/{}", lead["id"].as_str().unwrap()))
        .cookie(&cookie)
        .json(&lead_json("John Doe"))
        .send(&t);
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["details"][0]["field"], "updatedAt");
}

#[test]
fn other_users_leads_are_not_found() {
    let t = test_app();
    let owner = sign_in(&t, "owner@example.com");
    let intruder = sign_in(&t, "intruder@example.com");
    let lead = create(&t, &owner, &lead_json("John Doe"));
    let uri = format!("/api/leads/{}", lead["id"].as_str().unwrap());

    let mut edit = lead_json("Hijacked");
    edit["updatedAt"] = lead["updatedAt"].clone();

    assert_eq!(Call::new(Method::GET, &uri).cookie(&intruder).send(&t).status(), 404);
    assert_eq!(
        Call::new(Method::PUT, &uri).cookie(&intruder).json(&edit).send(&t).status(),
        404
    );
    assert_eq!(Call::new(Method::DELETE, &uri).cookie(&intruder).send(&t).status(), 404);
    assert_eq!(
        Call::new(Method::GET, format!("{uri}/history"))
            .cookie(&intruder)
            .send(&t)
            .status(),
        404
    );

    let list = body_json(Call::new(Method::GET, "/api/leads").cookie(&intruder).send(&t));
    assert_eq!(list["totalCount"], 0);
    assert_eq!(Call::new(Method::GET, &uri).cookie(&owner).send(&t).status(), 200);
}

#[test]
fn delete_removes_lead_and_history() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    let lead = create(&t, &cookie, &lead_json("John Doe"));
    let uri = format!("/api/leads/{}", lead["id"].as_str().unwrap());

    let resp = Call::new(Method::DELETE, &uri).cookie(&cookie).send(&t);
    assert_eq!(resp.status(), 200);
    assert_eq!(Call::new(Method::GET, &uri).cookie(&cookie).send(&t).status(), 404);
    assert_eq!(Call::new(Method::DELETE, &uri).cookie(&cookie).send(&t).status(), 404);

    let orphans: i64 = t
        .app
        .db
        .with_conn(|conn| {
            Ok(conn.query_row("select count(*) from lead_history", [], |r| r.get(0))?)
        })
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn list_filters_and_paginates() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    create(&t, &cookie, &lead_json("John Doe"));
    create(&t, &cookie, &lead_json("Johnny Walker"));
    let mut mohali = lead_json("John Mohali");
    mohali["city"] = json!("Mohali");
    create(&t, &cookie, &mohali);
    create(&t, &cookie, &lead_json("Priya Singh"));

    let page = body_json(
        Call::new(Method::GET, "/api/leads?search=john&city=Chandigarh&limit=1&page=2&sortBy=fullName&sortOrder=asc")
            .cookie(&cookie)
            .send(&t),
    );
    assert_eq!(page["totalCount"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["currentPage"], 2);
    assert_eq!(page["items"][0]["fullName"], "Johnny Walker");

    let clamped = body_json(
        Call::new(Method::GET, "/api/leads?page=0&limit=500")
            .cookie(&cookie)
            .send(&t),
    );
    assert_eq!(clamped["currentPage"], 1);
    assert_eq!(clamped["items"].as_array().unwrap().len(), 4);

    let resp = Call::new(Method::GET, "/api/leads?status=Bogus")
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 400);
}

#[test]
fn create_is_rate_limited_per_client() {
    let mut t = test_app();
    t.app.trust_forwarded_for = true;
    let cookie = sign_in(&t, "agent@example.com");

    let post = |ip: &str| {
        Call::new(Method::POST, "/api/leads")
            .cookie(&cookie)
            .header("X-Forwarded-For", ip)
            .json(&lead_json("John Doe"))
            .send(&t)
    };

    for _ in 0..5 {
        assert_eq!(post("203.0.113.5").status(), 201);
    }
    let limited = post("203.0.113.5");
    assert_eq!(limited.status(), 429);
    let retry: u64 = limited.headers()["Retry-After"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry));

    assert_eq!(post("198.51.100.1").status(), 201);
}

#[test]
fn untrusted_forwarded_for_cannot_dodge_the_limit() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    for i in 0..5 {
        let resp = Call::new(Method::POST, "/api/leads")
            .cookie(&cookie)
            .header("X-Forwarded-For", format!("198.51.100.{i}"))
            .json(&lead_json("John Doe"))
            .send(&t);
        assert_eq!(resp.status(), 201);
    }
    let resp = Call::new(Method::POST, "/api/leads")
        .cookie(&cookie)
        .header("X-Forwarded-For", "198.51.100.99")
        .json(&lead_json("John Doe"))
        .send(&t);
    assert_eq!(resp.status(), 429);
}
