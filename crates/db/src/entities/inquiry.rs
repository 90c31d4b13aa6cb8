//! Inquiry entity (contact form and property inquiries).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Handling status of an inquiry. Also used for consultation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    #[sea_orm(string_value = "PENDING")]
    #[default]
    Pending,
    #[sea_orm(string_value = "RESPONDED")]
    Responded,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "SPAM")]
    Spam,
}

/// What the inquiry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryType {
    /// About a specific listing.
    #[sea_orm(string_value = "PROPERTY")]
    Property,
    /// General contact form message.
    #[sea_orm(string_value = "GENERAL")]
    General,
    /// Request for a phone call back.
    #[sea_orm(string_value = "CALLBACK")]
    Callback,
}

/// Inquiry model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "inquiry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Listing the inquiry refers to; `None` for general inquiries.
    #[sea_orm(nullable)]
    pub property_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(nullable)]
    pub subject: Option<String>,
    pub inquiry_type: InquiryType,
    /// Page or channel the inquiry came from.
    #[sea_orm(nullable)]
    pub source: Option<String>,
    pub status: InquiryStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_response: Option<String>,
    #[sea_orm(nullable)]
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "SetNull"
    )]
    Property,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
