use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Contract {
    Table,
    InternetCents,
    CanonCents,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Recurring internet and canon charges, billed together with the rent.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Contract::Table)
                    .add_column_if_not_exists(
                        ColumnDef::new(Contract::InternetCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Contract::Table)
                    .add_column_if_not_exists(
                        ColumnDef::new(Contract::CanonCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Contract::Table)
                    .drop_column(Contract::CanonCents)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Contract::Table)
                    .drop_column(Contract::InternetCents)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
