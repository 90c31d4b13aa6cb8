//! Create property, `property_image` and `property_video` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Property::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Property::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Property::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Property::Slug).string_len(300).not_null().unique_key())
                    .col(ColumnDef::new(Property::Description).text().not_null())
                    .col(ColumnDef::new(Property::Price).double().not_null())
                    .col(ColumnDef::new(Property::PropertyType).string_len(32).not_null())
                    .col(ColumnDef::new(Property::ListingType).string_len(16).not_null())
                    .col(ColumnDef::new(Property::Address).string_len(512).not_null())
                    .col(ColumnDef::new(Property::City).string_len(128).not_null())
                    .col(ColumnDef::new(Property::State).string_len(128).not_null())
                    .col(ColumnDef::new(Property::Pincode).string_len(16))
                    .col(ColumnDef::new(Property::Latitude).double())
                    .col(ColumnDef::new(Property::Longitude).double())
                    .col(ColumnDef::new(Property::MapLink).text())
                    .col(ColumnDef::new(Property::Bedrooms).integer())
                    .col(ColumnDef::new(Property::Bathrooms).integer())
                    .col(ColumnDef::new(Property::Area).double())
                    .col(ColumnDef::new(Property::BuiltYear).integer())
                    .col(ColumnDef::new(Property::Floor).integer())
                    .col(ColumnDef::new(Property::TotalFloors).integer())
                    .col(ColumnDef::new(Property::Furnished).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Parking).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Balcony).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Garden).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Swimming).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Gym).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Security).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::Elevator).boolean().not_null().default(false))
                    .col(ColumnDef::new(Property::PowerBackup).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Property::Status)
                            .string_len(32)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(ColumnDef::new(Property::Highlight).string_len(16))
                    .col(ColumnDef::new(Property::MainImageUrl).text().not_null())
                    .col(ColumnDef::new(Property::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Property::ViewCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Property::ClickCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Property::ContactName).string_len(128))
                    .col(ColumnDef::new(Property::ContactPhone).string_len(32))
                    .col(ColumnDef::new(Property::ContactEmail).string_len(256))
                    .col(
                        ColumnDef::new(Property::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Property::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (is_active, created_at) for the public listing
        manager
            .create_index(
                Index::create()
                    .name("idx_property_active_created_at")
                    .table(Property::Table)
                    .col(Property::IsActive)
                    .col(Property::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: city (most common filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_property_city")
                    .table(Property::Table)
                    .col(Property::City)
                    .to_owned(),
            )
            .await?;

        // Index: (property_type, listing_type)
        manager
            .create_index(
                Index::create()
                    .name("idx_property_type_listing")
                    .table(Property::Table)
                    .col(Property::PropertyType)
                    .col(Property::ListingType)
                    .to_owned(),
            )
            .await?;

        // Index: highlight
        manager
            .create_index(
                Index::create()
                    .name("idx_property_highlight")
                    .table(Property::Table)
                    .col(Property::Highlight)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PropertyImage::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PropertyImage::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PropertyImage::PropertyId).string_len(32).not_null())
                    .col(ColumnDef::new(PropertyImage::Url).text().not_null())
                    .col(ColumnDef::new(PropertyImage::Caption).string_len(256))
                    .col(ColumnDef::new(PropertyImage::Order).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(PropertyImage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_image_property")
                            .from(PropertyImage::Table, PropertyImage::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_property_image_property_id")
                    .table(PropertyImage::Table)
                    .col(PropertyImage::PropertyId)
                    .col(PropertyImage::Order)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PropertyVideo::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PropertyVideo::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PropertyVideo::PropertyId).string_len(32).not_null())
                    .col(ColumnDef::new(PropertyVideo::Url).text().not_null())
                    .col(ColumnDef::new(PropertyVideo::Title).string_len(256))
                    .col(ColumnDef::new(PropertyVideo::Order).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(PropertyVideo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_video_property")
                            .from(PropertyVideo::Table, PropertyVideo::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_property_video_property_id")
                    .table(PropertyVideo::Table)
                    .col(PropertyVideo::PropertyId)
                    .col(PropertyVideo::Order)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyVideo::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PropertyImage::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Property::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Property {
    Table,
    Id,
    Title,
    Slug,
    Description,
    Price,
    PropertyType,
    ListingType,
    Address,
    City,
    State,
    Pincode,
    Latitude,
    Longitude,
    MapLink,
    Bedrooms,
    Bathrooms,
    Area,
    BuiltYear,
    Floor,
    TotalFloors,
    Furnished,
    Parking,
    Balcony,
    Garden,
    Swimming,
    Gym,
    Security,
    Elevator,
    PowerBackup,
    Status,
    Highlight,
    MainImageUrl,
    IsActive,
    ViewCount,
    ClickCount,
    ContactName,
    ContactPhone,
    ContactEmail,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PropertyImage {
    Table,
    Id,
    PropertyId,
    Url,
    Caption,
    Order,
    CreatedAt,
}

#[derive(Iden)]
enum PropertyVideo {
    Table,
    Id,
    PropertyId,
    Url,
    Title,
    Order,
    CreatedAt,
}
