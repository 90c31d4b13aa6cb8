//! Property (listing) entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of real estate being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    #[sea_orm(string_value = "APARTMENT")]
    Apartment,
    #[sea_orm(string_value = "VILLA")]
    Villa,
    #[sea_orm(string_value = "HOUSE")]
    House,
    #[sea_orm(string_value = "PLOT")]
    Plot,
    #[sea_orm(string_value = "COMMERCIAL")]
    Commercial,
    #[sea_orm(string_value = "OFFICE")]
    Office,
    #[sea_orm(string_value = "SHOP")]
    Shop,
    #[sea_orm(string_value = "PENTHOUSE")]
    Penthouse,
    #[sea_orm(string_value = "STUDIO")]
    Studio,
    #[sea_orm(string_value = "FARMHOUSE")]
    Farmhouse,
}

impl PropertyType {
    /// Database/wire name of the type.
    #[must_use]
    pub fn as_str(&self) -> String {
        self.to_value()
    }
}

/// Whether the listing is for sale, rent or lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingType {
    #[sea_orm(string_value = "SALE")]
    Sale,
    #[sea_orm(string_value = "RENT")]
    Rent,
    #[sea_orm(string_value = "LEASE")]
    Lease,
}

/// Market status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    #[default]
    Available,
    #[sea_orm(string_value = "SOLD")]
    Sold,
    #[sea_orm(string_value = "RENTED")]
    Rented,
    #[sea_orm(string_value = "UNDER_NEGOTIATION")]
    UnderNegotiation,
    #[sea_orm(string_value = "WITHDRAWN")]
    Withdrawn,
}

/// Promotional tag used for homepage curation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyHighlight {
    #[sea_orm(string_value = "NEW")]
    New,
    #[sea_orm(string_value = "TRENDING")]
    Trending,
    #[sea_orm(string_value = "FEATURED")]
    Featured,
    #[sea_orm(string_value = "HOT_DEAL")]
    HotDeal,
    #[sea_orm(string_value = "PREMIUM")]
    Premium,
}

/// Property listing model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "property")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// URL slug derived from the title, unique.
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Double")]
    pub price: f64,

    pub property_type: PropertyType,
    pub listing_type: ListingType,

    pub address: String,
    pub city: String,
    pub state: String,
    #[sea_orm(nullable)]
    pub pincode: Option<String>,

    #[sea_orm(column_type = "Double", nullable)]
    pub latitude: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub longitude: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub map_link: Option<String>,

    #[sea_orm(nullable)]
    pub bedrooms: Option<i32>,
    #[sea_orm(nullable)]
    pub bathrooms: Option<i32>,
    /// Built-up area in square feet.
    #[sea_orm(column_type = "Double", nullable)]
    pub area: Option<f64>,
    #[sea_orm(nullable)]
    pub built_year: Option<i32>,
    #[sea_orm(nullable)]
    pub floor: Option<i32>,
    #[sea_orm(nullable)]
    pub total_floors: Option<i32>,

    pub furnished: bool,
    pub parking: bool,
    pub balcony: bool,
    pub garden: bool,
    pub swimming: bool,
    pub gym: bool,
    pub security: bool,
    pub elevator: bool,
    pub power_backup: bool,

    pub status: PropertyStatus,
    #[sea_orm(nullable)]
    pub highlight: Option<PropertyHighlight>,

    pub main_image_url: String,

    /// Inactive listings are hidden from the public site.
    pub is_active: bool,

    pub view_count: i64,
    pub click_count: i64,

    #[sea_orm(nullable)]
    pub contact_name: Option<String>,
    #[sea_orm(nullable)]
    pub contact_phone: Option<String>,
    #[sea_orm(nullable)]
    pub contact_email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::property_video::Entity")]
    Videos,
    #[sea_orm(has_many = "super::inquiry::Entity")]
    Inquiries,
    #[sea_orm(has_many = "super::property_review::Entity")]
    Reviews,
}

impl Related<super::property_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::property_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl Related<super::inquiry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inquiries.def()
    }
}

impl Related<super::property_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
