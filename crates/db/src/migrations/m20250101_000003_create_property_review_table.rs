//! Create `property_review` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_property_tables::Property;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertyReview::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PropertyReview::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PropertyReview::PropertyId).string_len(32).not_null())
                    .col(ColumnDef::new(PropertyReview::ReviewerName).string_len(128).not_null())
                    .col(ColumnDef::new(PropertyReview::ReviewerEmail).string_len(256).not_null())
                    .col(ColumnDef::new(PropertyReview::ReviewerPhone).string_len(32))
                    .col(ColumnDef::new(PropertyReview::Rating).integer().not_null())
                    .col(ColumnDef::new(PropertyReview::Title).string_len(256))
                    .col(ColumnDef::new(PropertyReview::Comment).text().not_null())
                    .col(
                        ColumnDef::new(PropertyReview::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(PropertyReview::AdminResponse).text())
                    .col(
                        ColumnDef::new(PropertyReview::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PropertyReview::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(PropertyReview::Rating)
                            .gte(1)
                            .and(Expr::col(PropertyReview::Rating).lte(5)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_review_property")
                            .from(PropertyReview::Table, PropertyReview::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (property_id, status) for the public review list
        manager
            .create_index(
                Index::create()
                    .name("idx_property_review_property_status")
                    .table(PropertyReview::Table)
                    .col(PropertyReview::PropertyId)
                    .col(PropertyReview::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyReview::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PropertyReview {
    Table,
    Id,
    PropertyId,
    ReviewerName,
    ReviewerEmail,
    ReviewerPhone,
    Rating,
    Title,
    Comment,
    Status,
    AdminResponse,
    CreatedAt,
    UpdatedAt,
}
