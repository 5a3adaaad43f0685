mod common;

use axum::http::StatusCode;
use common::TestApp;
use rust_xlsxwriter::Workbook;
use serde_json::json;

const BOUNDARY: &str = "rentas-test-boundary";

fn multipart_body(xlsx: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"contracts.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(xlsx);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn import_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["First name", "Last name", "ID number", "Rent", "Start date"];
    for (c, h) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *h).unwrap();
    }
    // Existing tenant: should update. New tenant: should insert.
    for (r, (first, last, id_number, rent, start)) in [
        ("Maria", "Lopez", "8-123-456", 350.50, "2026-02-01"),
        ("Jose", "Diaz", "4-987-654", 420.0, "2026-03-15"),
        ("", "Broken", "0-000-000", 100.0, "2026-04-01"),
    ]
    .into_iter()
    .enumerate()
    {
        let row = (r + 1) as u32;
        sheet.write_string(row, 0, first).unwrap();
        sheet.write_string(row, 1, last).unwrap();
        sheet.write_string(row, 2, id_number).unwrap();
        sheet.write_number(row, 3, rent).unwrap();
        sheet.write_string(row, 4, start).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn import_creates_updates_and_reports_bad_rows() {
    let app = TestApp::new().await;
    app.request(
        "POST",
        "/contracts",
        Some(json!({
            "first_name": "Maria",
            "last_name": "Lopez",
            "id_number": "8-123-456",
            "rent_cents": 10_000,
            "start_date": "2026-01-01",
        })),
    )
    .await;

    let (status, body) = app
        .request_raw(
            "POST",
            "/contracts/import",
            &format!("multipart/form-data; boundary={BOUNDARY}"),
            multipart_body(&import_workbook()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["created"], 1);
    assert_eq!(report["updated"], 1);
    assert_eq!(report["skipped"], 1);
    assert!(
        report["errors"][0]
            .as_str()
            .unwrap()
            .contains("missing first name")
    );

    let (_, list) = app.request("GET", "/contracts?q=8-123-456", None).await;
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["rent_cents"], 35_050);
}

#[tokio::test]
async fn export_round_trips_through_the_import_parser() {
    let app = TestApp::new().await;
    for (first, id_number, rent) in [("Maria", "8-111-111", 30_000), ("Jose", "4-222-222", 50_000)]
    {
        app.request(
            "POST",
            "/contracts",
            Some(json!({
                "first_name": first,
                "last_name": "Tenant",
                "id_number": id_number,
                "rent_cents": rent,
                "start_date": "2026-01-01",
            })),
        )
        .await;
    }

    let (status, bytes) = app.get_bytes("/contracts/export").await;
    assert_eq!(status, StatusCode::OK);
    let rows = api::sheets::parse_workbook(&bytes).unwrap();
    assert_eq!(rows.len(), 2);
    let mut ids: Vec<String> = rows
        .iter()
        .map(|r| r.as_ref().unwrap().id_number.clone())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["4-222-222", "8-111-111"]);

    // The search filter applies to the export too.
    let (_, bytes) = app.get_bytes("/contracts/export?q=jose").await;
    let rows = api::sheets::parse_workbook(&bytes).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].as_ref().unwrap().first_name, "Jose");
}
