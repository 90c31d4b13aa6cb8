//! Expertise (consultation request) repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use estate_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::db_err;
use crate::entities::inquiry::InquiryStatus;
use crate::entities::{ExpertiseInquiry, expertise_inquiry};

use super::search_any;

/// Filters for the admin consultation request list.
#[derive(Debug, Clone, Default)]
pub struct ExpertiseFilter {
    pub status: Option<InquiryStatus>,
    pub consultation_type: Option<String>,
    /// Free text matched against name, email and phone.
    pub q: Option<String>,
}

impl ExpertiseFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(status) = self.status {
            cond = cond.add(expertise_inquiry::Column::Status.eq(status));
        }
        if let Some(t) = &self.consultation_type {
            cond = cond.add(expertise_inquiry::Column::ConsultationType.eq(t.as_str()));
        }
        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            cond = cond.add(search_any(
                &[
                    expertise_inquiry::Column::FullName,
                    expertise_inquiry::Column::Email,
                    expertise_inquiry::Column::Phone,
                ],
                q,
            ));
        }

        cond
    }
}

/// Repository for consultation requests.
#[derive(Clone)]
pub struct ExpertiseRepository {
    db: Arc<DatabaseConnection>,
}

impl ExpertiseRepository {
    /// Create a new expertise repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<expertise_inquiry::Model>> {
        ExpertiseInquiry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get a request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<expertise_inquiry::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Expertise inquiry not found: {id}")))
    }

    /// List requests, newest first. Returns the page and the total match count.
    pub async fn search(
        &self,
        filter: &ExpertiseFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<expertise_inquiry::Model>, u64)> {
        let query = ExpertiseInquiry::find().filter(filter.condition());

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let items = query
            .order_by(expertise_inquiry::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((items, total))
    }

    /// Create a new request.
    pub async fn create(
        &self,
        model: expertise_inquiry::ActiveModel,
    ) -> AppResult<expertise_inquiry::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Update a request.
    pub async fn update(
        &self,
        model: expertise_inquiry::ActiveModel,
    ) -> AppResult<expertise_inquiry::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Delete a request. Returns the number of deleted rows.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = ExpertiseInquiry::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Count all requests.
    pub async fn count(&self) -> AppResult<u64> {
        ExpertiseInquiry::find()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count requests with the given status.
    pub async fn count_with_status(&self, status: InquiryStatus) -> AppResult<u64> {
        ExpertiseInquiry::find()
            .filter(expertise_inquiry::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count requests received since `since`.
    pub async fn count_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        ExpertiseInquiry::find()
            .filter(expertise_inquiry::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count requests grouped by status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(String, i64)>> {
        ExpertiseInquiry::find()
            .select_only()
            .column(expertise_inquiry::Column::Status)
            .column_as(expertise_inquiry::Column::Id.count(), "count")
            .group_by(expertise_inquiry::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}
