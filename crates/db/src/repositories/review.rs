//! Property review repository.

use std::sync::Arc;

use chrono::Utc;
use estate_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;

use crate::db_err;
use crate::entities::property_review::ReviewStatus;
use crate::entities::{PropertyReview, property_review};

/// Filters for the admin review list.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
    pub property_id: Option<String>,
}

impl ReviewFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(status) = self.status {
            cond = cond.add(property_review::Column::Status.eq(status));
        }
        if let Some(property_id) = &self.property_id {
            cond = cond.add(property_review::Column::PropertyId.eq(property_id.as_str()));
        }
        cond
    }
}

/// Rating summary over a property's approved reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal, 0 when there are no reviews.
    pub average: f64,
    pub count: i64,
    /// Review counts for ratings 1 through 5.
    pub distribution: [i64; 5],
}

impl RatingSummary {
    /// Build a summary from `(rating, count)` pairs.
    #[must_use]
    pub fn from_counts(counts: &[(i32, i64)]) -> Self {
        let mut distribution = [0_i64; 5];
        for &(rating, count) in counts {
            if let Ok(idx) = usize::try_from(rating - 1) {
                if let Some(slot) = distribution.get_mut(idx) {
                    *slot += count;
                }
            }
        }

        let count: i64 = distribution.iter().sum();
        let weighted: i64 = distribution
            .iter()
            .zip(1_i64..)
            .map(|(n, rating)| n * rating)
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let average = if count == 0 {
            0.0
        } else {
            (weighted as f64 / count as f64 * 10.0).round() / 10.0
        };

        Self {
            average,
            count,
            distribution,
        }
    }
}

/// Repository for property reviews.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<property_review::Model>> {
        PropertyReview::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get a review by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<property_review::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review not found: {id}")))
    }

    /// List reviews, newest first. Returns the page and the total match count.
    pub async fn search(
        &self,
        filter: &ReviewFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<property_review::Model>, u64)> {
        let query = PropertyReview::find().filter(filter.condition());

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let items = query
            .order_by(property_review::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((items, total))
    }

    /// Rating summary of a property's approved reviews.
    pub async fn rating_summary(&self, property_id: &str) -> AppResult<RatingSummary> {
        let counts = PropertyReview::find()
            .select_only()
            .column(property_review::Column::Rating)
            .column_as(Expr::cust("COUNT(*)::BIGINT"), "count")
            .filter(property_review::Column::PropertyId.eq(property_id))
            .filter(property_review::Column::Status.eq(ReviewStatus::Approved))
            .group_by(property_review::Column::Rating)
            .into_tuple::<(i32, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(RatingSummary::from_counts(&counts))
    }

    /// Create a new review.
    pub async fn create(
        &self,
        model: property_review::ActiveModel,
    ) -> AppResult<property_review::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Update a review.
    pub async fn update(
        &self,
        model: property_review::ActiveModel,
    ) -> AppResult<property_review::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Set the status of the given reviews.
    pub async fn update_status_many(&self, ids: &[String], status: ReviewStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = PropertyReview::update_many()
            .col_expr(property_review::Column::Status, Expr::value(status))
            .col_expr(property_review::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(property_review::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete a review. Returns the number of deleted rows.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = PropertyReview::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Count reviews with the given status.
    pub async fn count_with_status(&self, status: ReviewStatus) -> AppResult<u64> {
        PropertyReview::find()
            .filter(property_review::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count reviews grouped by status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(String, i64)>> {
        PropertyReview::find()
            .select_only()
            .column(property_review::Column::Status)
            .column_as(property_review::Column::Id.count(), "count")
            .group_by(property_review::Column::Status)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_rating_summary_from_counts() {
        let summary = RatingSummary::from_counts(&[(5, 3), (4, 1), (1, 1)]);

        assert_eq!(summary.count, 5);
        assert_eq!(summary.distribution, [1, 0, 0, 1, 3]);
        // (5*3 + 4 + 1) / 5 = 4.0
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_summary_ignores_out_of_range() {
        let summary = RatingSummary::from_counts(&[(0, 2), (6, 1), (3, 2)]);

        assert_eq!(summary.count, 2);
        assert!((summary.average - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_summary_empty() {
        let summary = RatingSummary::from_counts(&[]);
        assert_eq!(summary, RatingSummary::default());
    }

    #[tokio::test]
    async fn test_update_status_many() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let affected = repo
            .update_status_many(
                &["r1".to_string(), "r2".to_string(), "r3".to_string()],
                ReviewStatus::Approved,
            )
            .await
            .unwrap();

        assert_eq!(affected, 3);
    }
}
