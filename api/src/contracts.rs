//! Contract CRUD: the dashboard listing with sort/search, the
//! upsert-by-id-number create path, updates, and single/batch deletes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::{DateTime, NaiveDate, Utc};
use entity::contract;
use platform_db::DbPool;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Serialize};
use tracing::info_span;
use uuid::Uuid;

use crate::{
    auth::require_session,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Active,
    Ended,
}

impl From<contract::Status> for ContractStatus {
    fn from(value: contract::Status) -> Self {
        match value {
            contract::Status::Active => ContractStatus::Active,
            contract::Status::Ended => ContractStatus::Ended,
        }
    }
}

impl From<ContractStatus> for contract::Status {
    fn from(value: ContractStatus) -> Self {
        match value {
            ContractStatus::Active => contract::Status::Active,
            ContractStatus::Ended => contract::Status::Ended,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ContractNode {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub address: String,
    pub contract_number: Option<String>,
    pub rent_cents: i64,
    pub equipment_cents: i64,
    pub deposit_cents: i64,
    pub internet_cents: i64,
    pub canon_cents: i64,
    pub monthly_cents: i64,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contract::Model> for ContractNode {
    fn from(model: contract::Model) -> Self {
        let monthly_cents = model.monthly_cents();
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            id_number: model.id_number,
            address: model.address,
            contract_number: model.contract_number,
            rent_cents: model.rent_cents,
            equipment_cents: model.equipment_cents,
            deposit_cents: model.deposit_cents,
            internet_cents: model.internet_cents,
            canon_cents: model.canon_cents,
            monthly_cents,
            status: model.status.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContractInput {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub address: Option<String>,
    pub contract_number: Option<String>,
    #[serde(default)]
    pub rent_cents: i64,
    #[serde(default)]
    pub equipment_cents: i64,
    #[serde(default)]
    pub deposit_cents: i64,
    #[serde(default)]
    pub internet_cents: i64,
    #[serde(default)]
    pub canon_cents: i64,
    pub status: Option<ContractStatus>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl ContractInput {
    /// Trim text fields and reject rows that cannot become a contract.
    fn validated(mut self) -> ApiResult<Self> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.id_number = self.id_number.trim().to_string();
        self.address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        self.contract_number = self
            .contract_number
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if self.first_name.is_empty() {
            return Err(ApiError::invalid("first_name must not be empty"));
        }
        if self.id_number.is_empty() {
            return Err(ApiError::invalid("id_number must not be empty"));
        }
        for (name, value) in [
            ("rent_cents", self.rent_cents),
            ("equipment_cents", self.equipment_cents),
            ("deposit_cents", self.deposit_cents),
            ("internet_cents", self.internet_cents),
            ("canon_cents", self.canon_cents),
        ] {
            if value < 0 {
                return Err(ApiError::invalid(format!("{name} must not be negative")));
            }
        }
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(ApiError::invalid("end_date must be after start_date"));
            }
        }
        Ok(self)
    }
}

fn assign(active: &mut contract::ActiveModel, input: &ContractInput) {
    active.first_name = Set(input.first_name.clone());
    active.last_name = Set(input.last_name.clone());
    active.id_number = Set(input.id_number.clone());
    active.address = Set(input.address.clone().unwrap_or_else(|| "N/A".to_string()));
    active.contract_number = Set(input.contract_number.clone());
    active.rent_cents = Set(input.rent_cents);
    active.equipment_cents = Set(input.equipment_cents);
    active.deposit_cents = Set(input.deposit_cents);
    active.internet_cents = Set(input.internet_cents);
    active.canon_cents = Set(input.canon_cents);
    active.status = Set(input.status.unwrap_or(ContractStatus::Active).into());
    active.start_date = Set(input.start_date);
    active.end_date = Set(input.end_date);
}

/// The query-before-write check the source system relied on instead of a
/// unique constraint: a matching id_number updates in place.
pub(crate) async fn upsert_by_id_number(
    db: &DbPool,
    input: ContractInput,
) -> ApiResult<(contract::Model, bool)> {
    let input = input.validated()?;
    let existing = contract::Entity::find()
        .filter(contract::Column::IdNumber.eq(input.id_number.clone()))
        .limit(1)
        .one(db)
        .await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    match existing {
        Some(model) => {
            let mut active: contract::ActiveModel = model.into();
            assign(&mut active, &input);
            active.updated_at = Set(now);
            let updated = active.update(db).await?;
            Ok((updated, false))
        }
        None => {
            let id = Uuid::new_v4();
            let mut active = contract::ActiveModel {
                id: Set(id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            assign(&mut active, &input);
            // Client-generated id; the driver's last-insert id is useless
            // for uuid keys on SQLite.
            contract::Entity::insert(active)
                .exec_without_returning(db)
                .await?;
            let inserted = contract::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal(anyhow::anyhow!("inserted contract not readable"))
                })?;
            Ok((inserted, true))
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SortKey {
    Name,
    IdNumber,
    StartDate,
    Rent,
    UpdatedAt,
}

impl SortKey {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(SortKey::Name),
            "id_number" => Some(SortKey::IdNumber),
            "start_date" => Some(SortKey::StartDate),
            "rent" => Some(SortKey::Rent),
            "updated_at" => Some(SortKey::UpdatedAt),
            _ => None,
        }
    }

    /// Dates and amounts read newest/largest first by default, text reads
    /// alphabetically (the legacy dashboard's heuristic, made explicit).
    fn default_order(self) -> Order {
        match self {
            SortKey::Name | SortKey::IdNumber => Order::Asc,
            SortKey::StartDate | SortKey::Rent | SortKey::UpdatedAt => Order::Desc,
        }
    }
}

fn apply_ordering(
    query: Select<contract::Entity>,
    key: SortKey,
    order: Order,
) -> Select<contract::Entity> {
    match key {
        SortKey::Name => query
            .order_by(contract::Column::LastName, order.clone())
            .order_by(contract::Column::FirstName, order),
        SortKey::IdNumber => query.order_by(contract::Column::IdNumber, order),
        SortKey::StartDate => query.order_by(contract::Column::StartDate, order),
        SortKey::Rent => query.order_by(contract::Column::RentCents, order),
        SortKey::UpdatedAt => query.order_by(contract::Column::UpdatedAt, order),
    }
}

/// Case-insensitive substring match over the denormalized text columns.
fn search_condition(q: &str) -> Condition {
    let pattern = format!("%{}%", q.to_lowercase());
    let mut condition = Condition::any();
    for column in [
        contract::Column::FirstName,
        contract::Column::LastName,
        contract::Column::IdNumber,
        contract::Column::Address,
        contract::Column::ContractNumber,
    ] {
        let lowered = Expr::expr(Func::lower(Expr::col(column)));
        condition = condition.add(lowered.like(pattern.clone()));
    }
    condition
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub q: Option<String>,
}

pub(crate) fn build_list_query(params: &ListQuery) -> ApiResult<Select<contract::Entity>> {
    let key = match params.sort.as_deref() {
        None => SortKey::StartDate,
        Some(raw) => SortKey::parse(raw).ok_or_else(|| {
            ApiError::invalid("sort must be one of name, id_number, start_date, rent, updated_at")
        })?,
    };
    let order = match params.dir.as_deref() {
        None => key.default_order(),
        Some("asc") => Order::Asc,
        Some("desc") => Order::Desc,
        Some(_) => return Err(ApiError::invalid("dir must be asc or desc")),
    };
    let mut query = contract::Entity::find();
    if let Some(q) = params.q.as_deref() {
        let trimmed = q.trim();
        if !trimmed.is_empty() {
            query = query.filter(search_condition(trimmed));
        }
    }
    Ok(apply_ordering(query, key, order))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<ContractNode>>> {
    require_session(&state, &jar).await?;
    let span = info_span!(
        "contracts.list",
        sort = params.sort.as_deref().unwrap_or("start_date"),
        has_q = params.q.as_deref().is_some_and(|q| !q.trim().is_empty())
    );
    let _guard = span.enter();
    let rows = build_list_query(&params)?.all(&state.pool).await?;
    Ok(Json(rows.into_iter().map(ContractNode::from).collect()))
}

pub async fn get_contract(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContractNode>> {
    require_session(&state, &jar).await?;
    let model = contract::Entity::find_by_id(id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(model.into()))
}

pub async fn create_contract(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(input): Json<ContractInput>,
) -> ApiResult<(StatusCode, Json<ContractNode>)> {
    require_session(&state, &jar).await?;
    let (model, created) = upsert_by_id_number(&state.pool, input).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(model.into())))
}

pub async fn update_contract(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
    Json(input): Json<ContractInput>,
) -> ApiResult<Json<ContractNode>> {
    require_session(&state, &jar).await?;
    let input = input.validated()?;
    let model = contract::Entity::find_by_id(id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    let mut active: contract::ActiveModel = model.into();
    assign(&mut active, &input);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.pool).await?;
    Ok(Json(updated.into()))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_session(&state, &jar).await?;
    let res = contract::Entity::delete_by_id(id).exec(&state.pool).await?;
    if res.rows_affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
}

/// One delete_many call; installments go with their contracts via the
/// cascade on the foreign key.
pub async fn batch_delete_contracts(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(body): Json<BatchDeleteRequest>,
) -> ApiResult<Json<BatchDeleteResponse>> {
    require_session(&state, &jar).await?;
    if body.ids.is_empty() {
        return Err(ApiError::invalid("ids must not be empty"));
    }
    let res = contract::Entity::delete_many()
        .filter(contract::Column::Id.is_in(body.ids))
        .exec(&state.pool)
        .await?;
    Ok(Json(BatchDeleteResponse {
        deleted: res.rows_affected,
    }))
}
