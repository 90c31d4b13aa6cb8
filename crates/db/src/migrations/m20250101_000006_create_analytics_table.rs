//! Create analytics table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Analytics::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Analytics::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Analytics::Date).date().not_null().unique_key())
                    .col(ColumnDef::new(Analytics::TotalViews).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Analytics::TotalClicks).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Analytics::TotalInquiries)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Analytics::NewProperties)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Analytics::TypeBreakdown)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Analytics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Analytics::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Analytics::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Analytics {
    Table,
    Id,
    Date,
    TotalViews,
    TotalClicks,
    TotalInquiries,
    NewProperties,
    TypeBreakdown,
    CreatedAt,
    UpdatedAt,
}
