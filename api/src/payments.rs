//! Monthly payment schedules: generation from the contract dates and the
//! per-contract installment views.

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::{DateTime, Months, NaiveDate, Utc};
use entity::{contract, installment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::require_session,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

impl From<installment::Status> for InstallmentStatus {
    fn from(value: installment::Status) -> Self {
        match value {
            installment::Status::Pending => InstallmentStatus::Pending,
            installment::Status::Paid => InstallmentStatus::Paid,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InstallmentNode {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub status: InstallmentStatus,
    pub note: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<installment::Model> for InstallmentNode {
    fn from(model: installment::Model) -> Self {
        Self {
            id: model.id,
            contract_id: model.contract_id,
            due_date: model.due_date,
            amount_cents: model.amount_cents,
            status: model.status.into(),
            note: model.note,
            paid_at: model.paid_at.map(|t| t.into()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScheduledInstallment {
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub note: Option<String>,
}

/// One installment per month from `start` (inclusive) while strictly before
/// `end`; month addition clamps the day, so a Jan 31 start dues Feb 28.
/// The first installment carries the deposit note.
pub fn build_schedule(
    start: NaiveDate,
    end: NaiveDate,
    monthly_cents: i64,
    deposit_cents: i64,
) -> Vec<ScheduledInstallment> {
    let mut out = Vec::new();
    for i in 0u32.. {
        let Some(due_date) = start.checked_add_months(Months::new(i)) else {
            break;
        };
        if due_date >= end {
            break;
        }
        let note = (i == 0 && deposit_cents > 0).then(|| {
            format!(
                "Deposit held: {:.2}",
                deposit_cents as f64 / 100.0
            )
        });
        out.push(ScheduledInstallment {
            due_date,
            amount_cents: monthly_cents,
            note,
        });
    }
    out
}

async fn load_contract(state: &AppState, id: Uuid) -> ApiResult<contract::Model> {
    contract::Entity::find_by_id(id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn list_installments(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<InstallmentNode>>> {
    require_session(&state, &jar).await?;
    load_contract(&state, id).await?;
    let rows = installment::Entity::find()
        .filter(installment::Column::ContractId.eq(id))
        .order_by_asc(installment::Column::DueDate)
        .all(&state.pool)
        .await?;
    Ok(Json(rows.into_iter().map(InstallmentNode::from).collect()))
}

/// Rebuild the schedule from the contract dates. Pending rows are replaced;
/// paid rows stay, and their months are not re-issued.
pub async fn generate_schedule(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<InstallmentNode>>> {
    require_session(&state, &jar).await?;
    let model = load_contract(&state, id).await?;
    let Some(end_date) = model.end_date else {
        return Err(ApiError::invalid(
            "contract has no end date; set one before generating a schedule",
        ));
    };

    let schedule = build_schedule(
        model.start_date,
        end_date,
        model.monthly_cents(),
        model.deposit_cents,
    );

    let paid: Vec<installment::Model> = installment::Entity::find()
        .filter(installment::Column::ContractId.eq(id))
        .filter(installment::Column::Status.eq(installment::Status::Paid))
        .all(&state.pool)
        .await?;
    let paid_months: Vec<(i32, u32)> = paid
        .iter()
        .map(|row| month_of(row.due_date))
        .collect();

    installment::Entity::delete_many()
        .filter(installment::Column::ContractId.eq(id))
        .filter(installment::Column::Status.eq(installment::Status::Pending))
        .exec(&state.pool)
        .await?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut issued = 0usize;
    for entry in schedule {
        if paid_months.contains(&month_of(entry.due_date)) {
            continue;
        }
        let row = installment::ActiveModel {
            id: Set(Uuid::new_v4()),
            contract_id: Set(id),
            due_date: Set(entry.due_date),
            amount_cents: Set(entry.amount_cents),
            status: Set(installment::Status::Pending),
            note: Set(entry.note),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        installment::Entity::insert(row)
            .exec_without_returning(&state.pool)
            .await?;
        issued += 1;
    }
    info!(contract_id = %id, issued, kept_paid = paid.len(), "schedule regenerated");

    let rows = installment::Entity::find()
        .filter(installment::Column::ContractId.eq(id))
        .order_by_asc(installment::Column::DueDate)
        .all(&state.pool)
        .await?;
    Ok(Json(rows.into_iter().map(InstallmentNode::from).collect()))
}

fn month_of(date: NaiveDate) -> (i32, u32) {
    use chrono::Datelike;
    (date.year(), date.month())
}

#[derive(Default, Deserialize)]
pub struct PayRequest {
    pub note: Option<String>,
}

pub async fn pay_installment(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
    body: Option<Json<PayRequest>>,
) -> ApiResult<Json<InstallmentNode>> {
    require_session(&state, &jar).await?;
    let model = installment::Entity::find_by_id(id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    if model.status == installment::Status::Paid {
        return Err(ApiError::invalid("installment is already paid"));
    }
    let note = body.and_then(|Json(req)| req.note);
    let mut active: installment::ActiveModel = model.into();
    active.status = Set(installment::Status::Paid);
    active.paid_at = Set(Some(Utc::now().into()));
    if let Some(note) = note {
        active.note = Set(Some(note));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.pool).await?;
    Ok(Json(updated.into()))
}
