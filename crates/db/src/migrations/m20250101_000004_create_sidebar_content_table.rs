//! Create `sidebar_content` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SidebarContent::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SidebarContent::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(SidebarContent::ImageUrl).text())
                    .col(ColumnDef::new(SidebarContent::VideoUrl).text())
                    .col(ColumnDef::new(SidebarContent::PhoneNumber).string_len(32))
                    .col(ColumnDef::new(SidebarContent::WhatsappNumber).string_len(32))
                    .col(
                        ColumnDef::new(SidebarContent::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SidebarContent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SidebarContent::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active row
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_sidebar_content_single_active
                ON sidebar_content (is_active)
                WHERE is_active;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SidebarContent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SidebarContent {
    Table,
    Id,
    ImageUrl,
    VideoUrl,
    PhoneNumber,
    WhatsappNumber,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
