mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{Value, json};

fn contract_body(first: &str, last: &str, id_number: &str, rent_cents: i64) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "id_number": id_number,
        "address": "Calle 50",
        "rent_cents": rent_cents,
        "deposit_cents": 2 * rent_cents,
        "start_date": "2026-01-01",
        "end_date": "2027-01-01",
    })
}

#[tokio::test]
async fn created_contract_is_retrievable_with_same_values() {
    let app = TestApp::new().await;
    let (status, created) = app
        .request(
            "POST",
            "/contracts",
            Some(contract_body("Maria", "Lopez", "8-123-456", 35_000)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = app.request("GET", &format!("/contracts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["first_name"], "Maria");
    assert_eq!(fetched["last_name"], "Lopez");
    assert_eq!(fetched["id_number"], "8-123-456");
    assert_eq!(fetched["address"], "Calle 50");
    assert_eq!(fetched["rent_cents"], 35_000);
    assert_eq!(fetched["deposit_cents"], 70_000);
    assert_eq!(fetched["status"], "ACTIVE");
    assert_eq!(fetched["start_date"], "2026-01-01");
}

#[tokio::test]
async fn create_with_known_id_number_updates_in_place() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request(
            "POST",
            "/contracts",
            Some(contract_body("Maria", "Lopez", "8-123-456", 35_000)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, updated) = app
        .request(
            "POST",
            "/contracts",
            Some(contract_body("Maria", "Lopez", "8-123-456", 40_000)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rent_cents"], 40_000);

    let (_, list) = app.request("GET", "/contracts", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn listing_sorts_and_searches() {
    let app = TestApp::new().await;
    for (first, last, id_number, rent) in [
        ("Maria", "Zamora", "8-111-111", 30_000),
        ("Jose", "Aguilar", "4-222-222", 50_000),
        ("Luis", "Mora", "2-333-333", 40_000),
    ] {
        app.request(
            "POST",
            "/contracts",
            Some(contract_body(first, last, id_number, rent)),
        )
        .await;
    }

    let (status, list) = app.request("GET", "/contracts?sort=name&dir=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    let lasts: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["last_name"].as_str().unwrap())
        .collect();
    assert_eq!(lasts, vec!["Aguilar", "Mora", "Zamora"]);

    let (_, list) = app.request("GET", "/contracts?sort=rent", None).await;
    let rents: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["rent_cents"].as_i64().unwrap())
        .collect();
    assert_eq!(rents, vec![50_000, 40_000, 30_000]);

    // Case-insensitive substring over the text columns.
    let (_, list) = app.request("GET", "/contracts?q=mOrA", None).await;
    let hits = list.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["last_name"], "Mora");

    let (_, list) = app.request("GET", "/contracts?q=2-333", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app.request("GET", "/contracts?sort=rowid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("GET", "/contracts?sort=name&dir=sideways", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = TestApp::new().await;
    let (_, created) = app
        .request(
            "POST",
            "/contracts",
            Some(contract_body("Maria", "Lopez", "8-123-456", 35_000)),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let mut body = contract_body("Maria", "Lopez de Diaz", "8-123-456", 36_500);
    body["status"] = json!("ENDED");
    body["internet_cents"] = json!(2_500);
    let (status, updated) = app
        .request("PUT", &format!("/contracts/{id}"), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["last_name"], "Lopez de Diaz");
    assert_eq!(updated["status"], "ENDED");
    assert_eq!(updated["monthly_cents"], 36_500 + 2_500);

    let (status, _) = app
        .request(
            "PUT",
            "/contracts/00000000-0000-0000-0000-000000000000",
            Some(contract_body("X", "Y", "1-1-1", 1)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_input_is_a_400() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            "POST",
            "/contracts",
            Some(json!({
                "first_name": "  ",
                "last_name": "Lopez",
                "id_number": "8-1",
                "start_date": "2026-01-01",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = app
        .request(
            "POST",
            "/contracts",
            Some(json!({
                "first_name": "Maria",
                "last_name": "Lopez",
                "id_number": "8-1",
                "rent_cents": -5,
                "start_date": "2026-01-01",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let app = TestApp::new().await;
    let (_, created) = app
        .request(
            "POST",
            "/contracts",
            Some(contract_body("Maria", "Lopez", "8-123-456", 35_000)),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app.request("DELETE", &format!("/contracts/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.request("GET", &format!("/contracts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request("DELETE", &format!("/contracts/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_delete_removes_exactly_the_requested_ids() {
    let app = TestApp::new().await;
    let mut ids = Vec::new();
    for (first, id_number) in [("A", "1-1"), ("B", "2-2"), ("C", "3-3")] {
        let (_, created) = app
            .request(
                "POST",
                "/contracts",
                Some(contract_body(first, "Last", id_number, 10_000)),
            )
            .await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }

    let (status, body) = app
        .request(
            "POST",
            "/contracts/batch-delete",
            Some(json!({ "ids": [ids[0], ids[2]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, list) = app.request("GET", "/contracts", None).await;
    let remaining = list.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"].as_str().unwrap(), ids[1]);

    let (status, _) = app
        .request("POST", "/contracts/batch-delete", Some(json!({ "ids": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
