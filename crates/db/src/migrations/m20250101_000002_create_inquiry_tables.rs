//! Create inquiry and `expertise_inquiry` tables migration.

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
                    .table(Inquiry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Inquiry::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Inquiry::PropertyId).string_len(32))
                    .col(ColumnDef::new(Inquiry::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Inquiry::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Inquiry::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Inquiry::Message).text().not_null())
                    .col(ColumnDef::new(Inquiry::Subject).string_len(256))
                    .col(
                        ColumnDef::new(Inquiry::InquiryType)
                            .string_len(16)
                            .not_null()
                            .default("GENERAL"),
                    )
                    .col(ColumnDef::new(Inquiry::Source).string_len(64))
                    .col(
                        ColumnDef::new(Inquiry::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Inquiry::AdminResponse).text())
                    .col(ColumnDef::new(Inquiry::RespondedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Inquiry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Inquiry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inquiry_property")
                            .from(Inquiry::Table, Inquiry::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the admin inbox
        manager
            .create_index(
                Index::create()
                    .name("idx_inquiry_status_created_at")
                    .table(Inquiry::Table)
                    .col(Inquiry::Status)
                    .col(Inquiry::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiry_property_id")
                    .table(Inquiry::Table)
                    .col(Inquiry::PropertyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpertiseInquiry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpertiseInquiry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpertiseInquiry::FullName).string_len(128).not_null())
                    .col(ColumnDef::new(ExpertiseInquiry::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(ExpertiseInquiry::Email).string_len(256).not_null())
                    .col(ColumnDef::new(ExpertiseInquiry::PreferredTimeSlot).string_len(64))
                    .col(
                        ColumnDef::new(ExpertiseInquiry::ConsultationType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpertiseInquiry::ServiceType).string_len(64))
                    .col(ColumnDef::new(ExpertiseInquiry::Message).text())
                    .col(
                        ColumnDef::new(ExpertiseInquiry::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(ExpertiseInquiry::AdminResponse).text())
                    .col(ColumnDef::new(ExpertiseInquiry::RespondedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ExpertiseInquiry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ExpertiseInquiry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expertise_inquiry_status_created_at")
                    .table(ExpertiseInquiry::Table)
                    .col(ExpertiseInquiry::Status)
                    .col(ExpertiseInquiry::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpertiseInquiry::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Inquiry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Inquiry {
    Table,
    Id,
    PropertyId,
    Name,
    Email,
    Phone,
    Message,
    Subject,
    InquiryType,
    Source,
    Status,
    AdminResponse,
    RespondedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpertiseInquiry {
    Table,
    Id,
    FullName,
    Phone,
    Email,
    PreferredTimeSlot,
    ConsultationType,
    ServiceType,
    Message,
    Status,
    AdminResponse,
    RespondedAt,
    CreatedAt,
    UpdatedAt,
}
