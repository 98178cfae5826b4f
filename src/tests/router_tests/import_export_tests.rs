use crate::tests::utils::{body_json, body_string, create, lead_json, sign_in, test_app, Call};
use http::Method;
use serde_json::json;
use std::io::Read;

const HEADER: &str = "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";

#[test]
fn csv_import_keeps_valid_rows_and_reports_bad_ones() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let csv = format!(
        "{HEADER}\n\
         John Doe,john@example.com,9876543210,Chandigarh,Apartment,2,Buy,5000000,8000000,3-6m,Website,\"Looking, 2BHK\",\"premium,apartment\",Qualified\n\
         Bad Row,,12,Mohali,Plot,,Buy,,,Exploring,Call,,,\n\
         \n\
         Jane,,9876500000,Mohali,Villa,,Rent,,,0-3m,Referral,,,\n\
         Shop Owner,,9876511111,Panchkula,Retail,,Buy,abc,,>6m,Walk-in,,,\n\
         Plot Buyer,,9876522222,Zirakpur,Plot,3,Buy,,,Exploring,Other,,,\n"
    );
    let resp = Call::new(Method::POST, "/api/leads/import")
        .cookie(&cookie)
        .csv(&csv)
        .send(&t);
    assert_eq!(resp.status(), 200);

    let result = body_json(resp);
    assert_eq!(result["success"], true);
    assert_eq!(result["imported"], 2);
    let rows: Vec<u64> = result["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_u64().unwrap())
        .collect();
    assert_eq!(rows, vec![3, 4, 5]);
    assert!(result["errors"][2]["message"]
        .as_str()
        .unwrap()
        .contains("Expected number"));

    let list = body_json(
        Call::new(Method::GET, "/api/leads?sortBy=fullName&sortOrder=asc")
            .cookie(&cookie)
            .send(&t),
    );
    assert_eq!(list["totalCount"], 2);
    let john = &list["items"][0];
    assert_eq!(john["status"], "Qualified");
    assert_eq!(john["notes"], "Looking, 2BHK");
    assert_eq!(john["tags"], json!(["premium", "apartment"]));
    assert_eq!(list["items"][1]["bhk"], json!(null));

    let history = body_json(
        Call::new(
            Method::GET,
            format!("/api/leads/{}/history", john["id"].as_str().unwrap()),
        )
        .cookie(&cookie)
        .send(&t),
    );
    assert_eq!(history[0]["diff"]["created"]["new"], "Record created via CSV import");
}

#[test]
fn csv_import_over_200_rows_is_refused_outright() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let row = "John Doe,,9876543210,Chandigarh,Plot,,Buy,,,Exploring,Call,,,";
    let csv = format!("{HEADER}\n{}\n", vec![row; 201].join("\n"));
    let resp = Call::new(Method::POST, "/api/leads/import")
        .cookie(&cookie)
        .csv(&csv)
        .send(&t);
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["error"], "Maximum 200 rows allowed");

    let list = body_json(Call::new(Method::GET, "/api/leads").cookie(&cookie).send(&t));
    assert_eq!(list["totalCount"], 0);
}

#[test]
fn csv_import_with_no_valid_rows_is_400() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let csv = format!("{HEADER}\nX,,1,Nowhere,Plot,,Buy,,,Exploring,Call,,,\n");
    let resp = Call::new(Method::POST, "/api/leads/import")
        .cookie(&cookie)
        .csv(&csv)
        .send(&t);
    assert_eq!(resp.status(), 400);
    let body = body_json(resp);
    assert_eq!(body["error"], "No valid rows to import");
    assert_eq!(body["errors"][0]["row"], 2);
}

#[test]
fn json_bulk_import_numbers_rows_from_one() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let mut bad_city = lead_json("Bad City");
    bad_city["city"] = json!("Delhi");
    let body = json!({ "leads": [lead_json("John Doe"), "not an object", bad_city] });

    let resp = Call::new(Method::PUT, "/api/leads")
        .cookie(&cookie)
        .json(&body)
        .send(&t);
    assert_eq!(resp.status(), 200);
    let result = body_json(resp);
    assert_eq!(result["imported"], 1);
    assert_eq!(result["errors"][0], json!({ "row": 2, "message": "Invalid data" }));
    assert_eq!(result["errors"][1]["row"], 3);

    let resp = Call::new(Method::PUT, "/api/leads")
        .cookie(&cookie)
        .json(&json!({ "leads": [] }))
        .send(&t);
    assert_eq!(resp.status(), 400);
    assert_eq!(body_json(resp)["error"], "Invalid data format");
}

#[test]
fn csv_export_respects_filters_and_quotes_fields() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");

    let mut quoted = lead_json("John Doe");
    quoted["notes"] = json!("says \"call after 6\"");
    create(&t, &cookie, &quoted);
    let mut mohali = lead_json("Mohali Buyer");
    mohali["city"] = json!("Mohali");
    create(&t, &cookie, &mohali);

    let resp = Call::new(Method::GET, "/api/leads/export?city=Chandigarh")
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["Content-Type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(resp.headers()["Content-Disposition"]
        .to_str()
        .unwrap()
        .contains("attachment; filename=\"leads-"));

    let text = body_string(resp);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("{HEADER},createdAt,updatedAt"));
    assert!(lines[1].starts_with("\"John Doe\",\"john@example.com\""));
    assert!(lines[1].contains("\"says \"\"call after 6\"\"\""));
}

#[test]
fn xlsx_export_is_a_workbook() {
    let t = test_app();
    let cookie = sign_in(&t, "agent@example.com");
    create(&t, &cookie, &lead_json("John Doe"));

    let resp = Call::new(Method::GET, "/api/leads/export.xlsx")
        .cookie(&cookie)
        .send(&t);
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    let mut bytes = Vec::new();
    resp.into_body().reader().read_to_end(&mut bytes).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}
