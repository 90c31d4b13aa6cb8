//! Daily analytics repository.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use estate_common::AppResult;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, Order,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db_err;
use crate::entities::{Analytics, analytics};

/// Adds one to `type_breakdown -> $1 -> $2`, creating the type entry with
/// zeroed counters first. Non-object breakdowns are replaced.
const BUMP_BREAKDOWN_SQL: &str = "jsonb_set(\
    jsonb_set(\
        CASE WHEN jsonb_typeof(type_breakdown) = 'object' THEN type_breakdown ELSE '{}'::jsonb END, \
        ARRAY[$1::text], \
        COALESCE(type_breakdown -> $1::text, \
            jsonb_build_object('views', 0, 'clicks', 0, 'inquiries', 0, 'newProperties', 0))\
    ), \
    ARRAY[$1::text, $2::text], \
    to_jsonb(COALESCE((type_breakdown #>> ARRAY[$1::text, $2::text])::bigint, 0) + 1)\
)";

/// Counter totals over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult)]
pub struct AnalyticsTotals {
    pub views: i64,
    pub clicks: i64,
    pub inquiries: i64,
    pub new_properties: i64,
}

/// Repository for the per-day analytics rows.
#[derive(Clone)]
pub struct AnalyticsRepository {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsRepository {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the row for a date.
    pub async fn find_by_date(&self, date: NaiveDate) -> AppResult<Option<analytics::Model>> {
        Analytics::find()
            .filter(analytics::Column::Date.eq(date))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert an empty row for `date` with `new_id` unless one exists.
    pub async fn ensure_day(&self, date: NaiveDate, new_id: String) -> AppResult<()> {
        let now = Utc::now();
        let row = analytics::ActiveModel {
            id: Set(new_id),
            date: Set(date),
            total_views: Set(0),
            total_clicks: Set(0),
            total_inquiries: Set(0),
            new_properties: Set(0),
            type_breakdown: Set(serde_json::json!({})),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Analytics::insert(row)
            .on_conflict(
                OnConflict::column(analytics::Column::Date)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Atomically add one to `column` of the row for `date` and, when given,
    /// to `type_breakdown[property_type][key]`. The row must exist.
    pub async fn increment(
        &self,
        date: NaiveDate,
        column: analytics::Column,
        breakdown: Option<(&str, &str)>,
    ) -> AppResult<u64> {
        let mut update = Analytics::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .col_expr(analytics::Column::UpdatedAt, Expr::value(Utc::now()));

        if let Some((property_type, key)) = breakdown {
            update = update.col_expr(
                analytics::Column::TypeBreakdown,
                Expr::cust_with_values(
                    BUMP_BREAKDOWN_SQL,
                    [property_type, key],
                ),
            );
        }

        let result = update
            .filter(analytics::Column::Date.eq(date))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Rows with `from <= date <= to`, oldest first.
    pub async fn find_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<analytics::Model>> {
        Analytics::find()
            .filter(analytics::Column::Date.gte(from))
            .filter(analytics::Column::Date.lte(to))
            .order_by(analytics::Column::Date, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Sum of all counters since `from` (inclusive).
    pub async fn totals_since(&self, from: NaiveDate) -> AppResult<AnalyticsTotals> {
        let totals = Analytics::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(total_views), 0)::BIGINT"), "views")
            .column_as(Expr::cust("COALESCE(SUM(total_clicks), 0)::BIGINT"), "clicks")
            .column_as(Expr::cust("COALESCE(SUM(total_inquiries), 0)::BIGINT"), "inquiries")
            .column_as(
                Expr::cust("COALESCE(SUM(new_properties), 0)::BIGINT"),
                "new_properties",
            )
            .filter(analytics::Column::Date.gte(from))
            .into_model::<AnalyticsTotals>()
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(totals.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_ensure_day_ignores_existing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = AnalyticsRepository::new(db);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(repo.ensure_day(date, "new".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_increment_is_a_single_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = AnalyticsRepository::new(db.clone());
        let date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let affected = repo
            .increment(date, analytics::Column::TotalViews, Some(("VILLA", "views")))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.starts_with(r#"UPDATE "analytics""#), "{sql}");
        assert!(sql.contains(r#""total_views" = "total_views" + $1"#), "{sql}");
        assert!(sql.contains("jsonb_set("), "{sql}");
        assert!(!sql.contains("SELECT"), "{sql}");
    }

    #[tokio::test]
    async fn test_increment_without_type_leaves_breakdown() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = AnalyticsRepository::new(db.clone());
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        repo.increment(date, analytics::Column::TotalInquiries, None)
            .await
            .unwrap();

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = log[0].statements()[0].sql.clone();
        assert!(sql.contains(r#""total_inquiries" = "total_inquiries" + $1"#), "{sql}");
        assert!(!sql.contains("type_breakdown"), "{sql}");
    }

    #[tokio::test]
    async fn test_totals_since() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "views" => Value::BigInt(Some(120)),
                    "clicks" => Value::BigInt(Some(30)),
                    "inquiries" => Value::BigInt(Some(4)),
                    "new_properties" => Value::BigInt(Some(2)),
                }]])
                .into_connection(),
        );

        let repo = AnalyticsRepository::new(db);
        let totals = repo
            .totals_since(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(totals.views, 120);
        assert_eq!(totals.new_properties, 2);
    }
}
