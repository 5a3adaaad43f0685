use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Contract {
    Table,
    Id,
    FirstName,
    LastName,
    IdNumber,
    Address,
    ContractNumber,
    RentCents,
    EquipmentCents,
    DepositCents,
    Status,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Installment {
    Table,
    Id,
    ContractId,
    DueDate,
    AmountCents,
    Status,
    Note,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    Username,
    CreatedAt,
    ExpiresAt,
    Ip,
    UserAgent,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contract::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contract::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Contract::FirstName).string_len(128).not_null())
                    .col(ColumnDef::new(Contract::LastName).string_len(128).not_null())
                    .col(ColumnDef::new(Contract::IdNumber).string_len(64).not_null())
                    .col(ColumnDef::new(Contract::Address).string_len(512).not_null())
                    .col(ColumnDef::new(Contract::ContractNumber).string_len(64))
                    .col(
                        ColumnDef::new(Contract::RentCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contract::EquipmentCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contract::DepositCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contract::Status)
                            .string_len(32)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Contract::StartDate).date().not_null())
                    .col(ColumnDef::new(Contract::EndDate).date())
                    .col(
                        ColumnDef::new(Contract::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Contract::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        // The id_number lookup backs both the dashboard search and the
        // upsert-by-id-number check; not unique on purpose.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contract_id_number")
                    .table(Contract::Table)
                    .col(Contract::IdNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Installment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installment::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Installment::ContractId).uuid().not_null())
                    .col(ColumnDef::new(Installment::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Installment::AmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Installment::Status)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Installment::Note).string_len(512))
                    .col(ColumnDef::new(Installment::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Installment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Installment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_installment_contract")
                            .from(Installment::Table, Installment::ContractId)
                            .to(Contract::Table, Contract::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_installment_contract_due")
                    .table(Installment::Table)
                    .col(Installment::ContractId)
                    .col(Installment::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::Username).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Sessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::Ip).string_len(64))
                    .col(ColumnDef::new(Sessions::UserAgent).string_len(512))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installment::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contract::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
