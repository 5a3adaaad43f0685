#![allow(dead_code)]

use std::sync::Arc;

use api::{AppState, auth::AuthConfig, build_router};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use http_body_util::BodyExt;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub cookie: String,
}

impl TestApp {
    /// Fresh in-memory database, bootstrapped schema, logged-in session.
    pub async fn new() -> Self {
        // One pooled connection so every query sees the same in-memory db.
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        bootstrap_sqlite(&db).await;
        let state = AppState {
            pool: db.clone(),
            auth: Arc::new(AuthConfig::default()),
            cookie_key: Key::from(&[7u8; 64]),
        };
        let router = build_router(state);
        let cookie = login(&router, "admin", "1234").await.unwrap();
        Self { router, db, cookie }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_json(&self.router, method, uri, Some(&self.cookie), body).await
    }

    pub async fn request_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, &self.cookie)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn get_bytes(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::COOKIE, &self.cookie)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }
}

/// POST the credential and hand back the session cookie pair.
pub async fn login(router: &Router, username: &str, password: &str) -> Option<String> {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    if response.status() != StatusCode::OK {
        return None;
    }
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(set_cookie.split(';').next()?.to_string())
}

pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn bootstrap_sqlite(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await
    .unwrap();

    for ddl in [
        "CREATE TABLE contract (
            id uuid PRIMARY KEY,
            first_name text NOT NULL,
            last_name text NOT NULL,
            id_number text NOT NULL,
            address text NOT NULL,
            contract_number text,
            rent_cents bigint NOT NULL DEFAULT 0,
            equipment_cents bigint NOT NULL DEFAULT 0,
            deposit_cents bigint NOT NULL DEFAULT 0,
            internet_cents bigint NOT NULL DEFAULT 0,
            canon_cents bigint NOT NULL DEFAULT 0,
            status text NOT NULL DEFAULT 'ACTIVE',
            start_date text NOT NULL,
            end_date text,
            created_at text NOT NULL,
            updated_at text NOT NULL
        );",
        "CREATE INDEX idx_contract_id_number ON contract (id_number);",
        "CREATE TABLE installment (
            id uuid PRIMARY KEY,
            contract_id uuid NOT NULL REFERENCES contract(id) ON DELETE CASCADE,
            due_date text NOT NULL,
            amount_cents bigint NOT NULL DEFAULT 0,
            status text NOT NULL DEFAULT 'PENDING',
            note text,
            paid_at text,
            created_at text NOT NULL,
            updated_at text NOT NULL
        );",
        "CREATE INDEX idx_installment_contract_due ON installment (contract_id, due_date);",
        "CREATE TABLE sessions (
            id uuid PRIMARY KEY,
            username text NOT NULL,
            created_at text NOT NULL,
            expires_at text NOT NULL,
            ip text,
            user_agent text
        );",
    ] {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, ddl))
            .await
            .unwrap();
    }
}
