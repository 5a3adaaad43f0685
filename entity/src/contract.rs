use sea_orm::entity::prelude::*;

/// A rental contract for one tenant. Monetary columns are integer cents.
/// Uniqueness of `id_number` is by convention, enforced with a
/// query-before-write check rather than a database constraint.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "contract")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(indexed)]
    pub id_number: String,
    pub address: String,
    pub contract_number: Option<String>,
    pub rent_cents: i64,
    pub equipment_cents: i64,
    pub deposit_cents: i64,
    pub internet_cents: i64,
    pub canon_cents: i64,
    pub status: Status,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Amount due each month: base rent plus the recurring charges.
    pub fn monthly_cents(&self) -> i64 {
        self.rent_cents + self.internet_cents + self.canon_cents
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::installment::Entity")]
    Installment,
}

impl Related<super::installment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installment.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "ENDED")]
    Ended,
}

impl ActiveModelBehavior for ActiveModel {}
