//! Daily analytics counters.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per calendar day (UTC).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "analytics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub date: NaiveDate,
    pub total_views: i64,
    pub total_clicks: i64,
    pub total_inquiries: i64,
    pub new_properties: i64,
    /// Counters per property type:
    /// `{"APARTMENT": {"views": 3, "clicks": 1, "inquiries": 0, "newProperties": 0}}`
    #[sea_orm(column_type = "JsonBinary")]
    pub type_breakdown: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
