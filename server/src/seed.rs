use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use entity::contract;
use platform_db::DbPool;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Demo fixtures for a fresh database. Existing id_numbers are left alone
/// so re-running the command is harmless.
pub async fn seed_demo_contracts(pool: &DbPool) -> Result<usize> {
    let fixtures = [
        ("Maria", "Lopez", "8-123-456", "Calle 50, Apt 3B", 35_000_i64, 70_000_i64),
        ("Jose", "Diaz", "4-987-654", "Via Espana 120", 42_000, 84_000),
    ];

    let start_date = NaiveDate::from_ymd_opt(2026, 1, 1).context("fixture start date")?;
    let end_date = NaiveDate::from_ymd_opt(2027, 1, 1);

    let mut inserted = 0usize;
    for (first, last, id_number, address, rent_cents, deposit_cents) in fixtures {
        let exists = contract::Entity::find()
            .filter(contract::Column::IdNumber.eq(id_number))
            .one(pool)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let now = Utc::now().into();
        let fixture = contract::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(first.into()),
            last_name: Set(last.into()),
            id_number: Set(id_number.into()),
            address: Set(address.into()),
            contract_number: Set(None),
            rent_cents: Set(rent_cents),
            equipment_cents: Set(0),
            deposit_cents: Set(deposit_cents),
            internet_cents: Set(2_500),
            canon_cents: Set(0),
            status: Set(contract::Status::Active),
            start_date: Set(start_date),
            end_date: Set(end_date),
            created_at: Set(now),
            updated_at: Set(now),
        };
        contract::Entity::insert(fixture)
            .exec_without_returning(pool)
            .await?;
        inserted += 1;
    }
    Ok(inserted)
}
