//! Expertise (consultation request) entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::inquiry::InquiryStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "expertise_inquiry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    /// Free-form slot such as "Morning (9 AM - 12 PM)"
    #[sea_orm(nullable)]
    pub preferred_time_slot: Option<String>,
    /// Phone, video call, site visit, ...
    pub consultation_type: String,
    /// Buying, selling, legal, valuation, ...
    #[sea_orm(nullable)]
    pub service_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub status: InquiryStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_response: Option<String>,
    #[sea_orm(nullable)]
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
