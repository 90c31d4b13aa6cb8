//! Inquiry repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use estate_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::db_err;
use crate::entities::inquiry::{InquiryStatus, InquiryType};
use crate::entities::{Inquiry, inquiry};

use super::search_any;

/// Filters for the admin inquiry list.
#[derive(Debug, Clone, Default)]
pub struct InquiryFilter {
    pub status: Option<InquiryStatus>,
    pub property_id: Option<String>,
    pub inquiry_type: Option<InquiryType>,
    /// Free text matched against name, email, phone and message.
    pub q: Option<String>,
}

impl InquiryFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(status) = self.status {
            cond = cond.add(inquiry::Column::Status.eq(status));
        }
        if let Some(property_id) = &self.property_id {
            cond = cond.add(inquiry::Column::PropertyId.eq(property_id.as_str()));
        }
        if let Some(t) = self.inquiry_type {
            cond = cond.add(inquiry::Column::InquiryType.eq(t));
        }
        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            cond = cond.add(search_any(
                &[
                    inquiry::Column::Name,
                    inquiry::Column::Email,
                    inquiry::Column::Phone,
                    inquiry::Column::Message,
                ],
                q,
            ));
        }

        cond
    }
}

/// Repository for inquiry operations.
#[derive(Clone)]
pub struct InquiryRepository {
    db: Arc<DatabaseConnection>,
}

impl InquiryRepository {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an inquiry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<inquiry::Model>> {
        Inquiry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get an inquiry by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<inquiry::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Inquiry not found: {id}")))
    }

    /// List inquiries, newest first. Returns the page and the total match count.
    pub async fn search(
        &self,
        filter: &InquiryFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<inquiry::Model>, u64)> {
        let query = Inquiry::find().filter(filter.condition());

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let items = query
            .order_by(inquiry::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((items, total))
    }

    /// Create a new inquiry.
    pub async fn create(&self, model: inquiry::ActiveModel) -> AppResult<inquiry::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Update an inquiry.
    pub async fn update(&self, model: inquiry::ActiveModel) -> AppResult<inquiry::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Set the status of the given inquiries. Rows outside `ids` are untouched.
    pub async fn update_status_many(&self, ids: &[String], status: InquiryStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut update = Inquiry::update_many()
            .col_expr(inquiry::Column::Status, Expr::value(status))
            .col_expr(inquiry::Column::UpdatedAt, Expr::value(now));

        if status == InquiryStatus::Responded {
            update = update.col_expr(inquiry::Column::RespondedAt, Expr::value(now));
        }

        let result = update
            .filter(inquiry::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }

    /// Delete an inquiry. Returns the number of deleted rows.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Inquiry::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Count all inquiries.
    pub async fn count(&self) -> AppResult<u64> {
        Inquiry::find().count(self.db.as_ref()).await.map_err(db_err)
    }

    /// Count inquiries received since `since`.
    pub async fn count_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        Inquiry::find()
            .filter(inquiry::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count inquiries grouped by status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(String, i64)>> {
        Inquiry::find()
            .select_only()
            .column(inquiry::Column::Status)
            .column_as(inquiry::Column::Id.count(), "count")
            .group_by(inquiry::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait, Value};

    fn test_inquiry(id: &str, status: InquiryStatus) -> inquiry::Model {
        inquiry::Model {
            id: id.to_string(),
            property_id: Some("p1".to_string()),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+919876543210".to_string(),
            message: "Is this still available?".to_string(),
            subject: None,
            inquiry_type: InquiryType::Property,
            source: None,
            status,
            admin_response: None,
            responded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_condition() {
        let filter = InquiryFilter {
            status: Some(InquiryStatus::Pending),
            q: Some("asha".to_string()),
            ..Default::default()
        };

        let sql = Inquiry::find()
            .filter(filter.condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("\"status\" = 'PENDING'"));
        assert!(sql.contains("LOWER(\"email\") LIKE '%asha%'"));
    }

    #[tokio::test]
    async fn test_search_returns_page_and_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(1))
                }]])
                .append_query_results([[test_inquiry("i1", InquiryStatus::Pending)]])
                .into_connection(),
        );

        let repo = InquiryRepository::new(db);
        let (items, total) = repo.search(&InquiryFilter::default(), 0, 20).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(items[0].id, "i1");
    }

    #[tokio::test]
    async fn test_bulk_status_targets_only_given_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = InquiryRepository::new(db);
        let affected = repo
            .update_status_many(&["i1".to_string(), "i2".to_string()], InquiryStatus::Closed)
            .await
            .unwrap();

        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn test_bulk_status_with_no_ids_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = InquiryRepository::new(db);
        let affected = repo
            .update_status_many(&[], InquiryStatus::Spam)
            .await
            .unwrap();

        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_delete_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = InquiryRepository::new(db);
        assert_eq!(repo.delete("missing").await.unwrap(), 0);
    }
}
