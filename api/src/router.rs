use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::{auth, contracts, payments, sheets, state::AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/contracts",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route(
            "/contracts/{id}",
            get(contracts::get_contract)
                .put(contracts::update_contract)
                .delete(contracts::delete_contract),
        )
        .route(
            "/contracts/batch-delete",
            post(contracts::batch_delete_contracts),
        )
        .route("/contracts/import", post(sheets::import_contracts))
        .route("/contracts/export", get(sheets::export_contracts))
        .route(
            "/contracts/{id}/installments",
            get(payments::list_installments),
        )
        .route("/contracts/{id}/schedule", post(payments::generate_schedule))
        .route("/installments/{id}/pay", post(payments::pay_installment))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    // `ok` is process liveness; the database gets its own flag.
    Json(HealthResponse {
        ok: true,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}
