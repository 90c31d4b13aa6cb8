//! Analytics service.
//!
//! Counters are recorded into one row per UTC day. Recording never fails the
//! caller; errors are logged and dropped.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use estate_common::{AppError, AppResult, IdGenerator};
use estate_db::entities::inquiry::InquiryStatus;
use estate_db::entities::property::PropertyType;
use estate_db::entities::property_review::ReviewStatus;
use estate_db::entities::{analytics, property};
use estate_db::repositories::{
    AnalyticsRepository, ExpertiseRepository, InquiryRepository, PropertyRepository,
    PropertyTypeStats, ReviewRepository,
};
use serde::Serialize;

/// Default length of the daily series.
pub const DEFAULT_DAYS: u32 = 30;
/// Longest daily series that can be requested.
pub const MAX_DAYS: u32 = 365;
/// Default number of top properties.
pub const DEFAULT_TOP_LIMIT: u64 = 10;

/// A countable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEvent {
    View,
    Click,
    Inquiry,
    NewProperty,
}

impl AnalyticsEvent {
    /// Key used in the per-type breakdown.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::View => "views",
            Self::Click => "clicks",
            Self::Inquiry => "inquiries",
            Self::NewProperty => "newProperties",
        }
    }

    /// Daily total the event counts towards.
    #[must_use]
    pub const fn column(self) -> analytics::Column {
        match self {
            Self::View => analytics::Column::TotalViews,
            Self::Click => analytics::Column::TotalClicks,
            Self::Inquiry => analytics::Column::TotalInquiries,
            Self::NewProperty => analytics::Column::NewProperties,
        }
    }
}

/// Counters for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub views: i64,
    pub clicks: i64,
    pub inquiries: i64,
    pub new_properties: i64,
}

impl DailyPoint {
    /// A day with no activity.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            views: 0,
            clicks: 0,
            inquiries: 0,
            new_properties: 0,
        }
    }
}

impl From<&analytics::Model> for DailyPoint {
    fn from(row: &analytics::Model) -> Self {
        Self {
            date: row.date,
            views: row.total_views,
            clicks: row.total_clicks,
            inquiries: row.total_inquiries,
            new_properties: row.new_properties,
        }
    }
}

/// Listing counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOverview {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_status: BTreeMap<String, i64>,
}

/// Inquiry counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryOverview {
    pub total: u64,
    pub today: u64,
    pub by_status: BTreeMap<String, i64>,
}

/// Admin dashboard numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub properties: PropertyOverview,
    pub inquiries: InquiryOverview,
    pub pending_reviews: u64,
    pub pending_expertise: u64,
    pub total_views: i64,
    pub total_clicks: i64,
    pub today: DailyPoint,
}

/// Views and clicks of one listing, for the top properties table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProperty {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub property_type: PropertyType,
    pub city: String,
    pub main_image_url: String,
    pub view_count: i64,
    pub click_count: i64,
}

impl From<property::Model> for TopProperty {
    fn from(p: property::Model) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            property_type: p.property_type,
            city: p.city,
            main_image_url: p.main_image_url,
            view_count: p.view_count,
            click_count: p.click_count,
        }
    }
}

/// Service for recording and reading analytics.
#[derive(Clone)]
pub struct AnalyticsService {
    analytics_repo: AnalyticsRepository,
    property_repo: PropertyRepository,
    inquiry_repo: InquiryRepository,
    expertise_repo: ExpertiseRepository,
    review_repo: ReviewRepository,
    id_gen: IdGenerator,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        analytics_repo: AnalyticsRepository,
        property_repo: PropertyRepository,
        inquiry_repo: InquiryRepository,
        expertise_repo: ExpertiseRepository,
        review_repo: ReviewRepository,
    ) -> Self {
        Self {
            analytics_repo,
            property_repo,
            inquiry_repo,
            expertise_repo,
            review_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Recording ====================

    /// Record an event for today. Failures are logged, never returned.
    pub async fn record(&self, event: AnalyticsEvent, property_type: Option<PropertyType>) {
        if let Err(e) = self.try_record(event, property_type).await {
            tracing::warn!(event = event.key(), error = %e, "Failed to record analytics event");
        }
    }

    async fn try_record(
        &self,
        event: AnalyticsEvent,
        property_type: Option<PropertyType>,
    ) -> AppResult<()> {
        let today = Utc::now().date_naive();
        self.analytics_repo
            .ensure_day(today, self.id_gen.generate())
            .await?;

        let type_name = property_type.map(|t| t.as_str());
        let breakdown = type_name.as_deref().map(|t| (t, event.key()));
        let updated = self
            .analytics_repo
            .increment(today, event.column(), breakdown)
            .await?;
        if updated == 0 {
            return Err(AppError::Internal(format!(
                "Analytics row for {today} missing"
            )));
        }
        Ok(())
    }

    /// Count a listing view.
    pub async fn record_view(&self, property_type: PropertyType) {
        self.record(AnalyticsEvent::View, Some(property_type)).await;
    }

    /// Count a click on a listing.
    pub async fn record_click(&self, property_type: PropertyType) {
        self.record(AnalyticsEvent::Click, Some(property_type)).await;
    }

    /// Count an inquiry, by type when it concerns a listing.
    pub async fn record_inquiry(&self, property_type: Option<PropertyType>) {
        self.record(AnalyticsEvent::Inquiry, property_type).await;
    }

    /// Count a newly created listing.
    pub async fn record_new_property(&self, property_type: PropertyType) {
        self.record(AnalyticsEvent::NewProperty, Some(property_type))
            .await;
    }

    // ==================== Reads ====================

    /// Dashboard overview.
    pub async fn dashboard(&self) -> AppResult<DashboardOverview> {
        let today = Utc::now().date_naive();
        let start_of_day = today
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| AppError::Internal("Invalid start of day".to_string()))?;

        let (total, active, property_status) = tokio::try_join!(
            self.property_repo.count(None),
            self.property_repo.count(Some(true)),
            self.property_repo.count_by_status(),
        )?;
        let (inquiry_total, inquiry_today, inquiry_status) = tokio::try_join!(
            self.inquiry_repo.count(),
            self.inquiry_repo.count_since(start_of_day),
            self.inquiry_repo.count_by_status(),
        )?;
        let (pending_reviews, pending_expertise, (total_views, total_clicks), today_row) = tokio::try_join!(
            self.review_repo.count_with_status(ReviewStatus::Pending),
            self.expertise_repo.count_with_status(InquiryStatus::Pending),
            self.property_repo.counter_totals(),
            self.analytics_repo.find_by_date(today),
        )?;

        Ok(DashboardOverview {
            properties: PropertyOverview {
                total,
                active,
                inactive: total.saturating_sub(active),
                by_status: property_status.into_iter().collect(),
            },
            inquiries: InquiryOverview {
                total: inquiry_total,
                today: inquiry_today,
                by_status: inquiry_status.into_iter().collect(),
            },
            pending_reviews,
            pending_expertise,
            total_views,
            total_clicks,
            today: today_row
                .as_ref()
                .map_or_else(|| DailyPoint::empty(today), DailyPoint::from),
        })
    }

    /// Counters for the last `days` days (clamped to 1..=365), oldest first,
    /// with days without a row reported as zero.
    pub async fn daily(&self, days: Option<u32>) -> AppResult<Vec<DailyPoint>> {
        let days = days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
        let to = Utc::now().date_naive();
        let from = to - Duration::days(i64::from(days - 1));

        let rows = self.analytics_repo.find_range(from, to).await?;
        Ok(fill_daily_series(from, to, &rows))
    }

    /// Count, views and clicks per property type.
    pub async fn property_types(&self) -> AppResult<Vec<PropertyTypeStats>> {
        self.property_repo.stats_by_type().await
    }

    /// Most viewed listings.
    pub async fn top_properties(&self, limit: Option<u64>) -> AppResult<Vec<TopProperty>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, 100);
        let properties = self.property_repo.find_top_by_views(limit).await?;
        Ok(properties.into_iter().map(TopProperty::from).collect())
    }
}

/// One point per day in `from..=to`, zero for days without a row.
#[must_use]
pub fn fill_daily_series(
    from: NaiveDate,
    to: NaiveDate,
    rows: &[analytics::Model],
) -> Vec<DailyPoint> {
    let by_date: HashMap<NaiveDate, &analytics::Model> =
        rows.iter().map(|row| (row.date, row)).collect();

    from.iter_days()
        .take_while(|date| *date <= to)
        .map(|date| {
            by_date
                .get(&date)
                .map_or_else(|| DailyPoint::empty(date), |row| DailyPoint::from(*row))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn day(date: NaiveDate, views: i64) -> analytics::Model {
        analytics::Model {
            id: format!("d{date}"),
            date,
            total_views: views,
            total_clicks: 0,
            total_inquiries: 0,
            new_properties: 0,
            type_breakdown: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(db: DatabaseConnection) -> AnalyticsService {
        let db = Arc::new(db);
        AnalyticsService::new(
            AnalyticsRepository::new(db.clone()),
            PropertyRepository::new(db.clone()),
            InquiryRepository::new(db.clone()),
            ExpertiseRepository::new(db.clone()),
            ReviewRepository::new(db),
        )
    }

    #[test]
    fn test_event_columns_and_keys() {
        assert!(matches!(
            AnalyticsEvent::View.column(),
            analytics::Column::TotalViews
        ));
        assert!(matches!(
            AnalyticsEvent::NewProperty.column(),
            analytics::Column::NewProperties
        ));
        assert_eq!(AnalyticsEvent::Inquiry.key(), "inquiries");
    }

    #[test]
    fn test_fill_daily_series_zero_fills_gaps() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let rows = [day(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), 7)];

        let series = fill_daily_series(from, to, &rows);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0], DailyPoint::empty(from));
        assert_eq!(series[2].views, 7);
        assert_eq!(series[3].date, to);
        assert_eq!(series[3].views, 0);
    }

    #[tokio::test]
    async fn test_daily_clamps_days() {
        let today = Utc::now().date_naive();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[day(today, 4)]])
            .into_connection();

        let series = service(db).daily(Some(0)).await.unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].views, 4);
    }

    #[tokio::test]
    async fn test_record_updates_counters_without_reading() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        service(db)
            .try_record(AnalyticsEvent::View, Some(PropertyType::House))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_reports_missing_day_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let result = service(db).try_record(AnalyticsEvent::Click, None).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_record_swallows_errors() {
        // No mock results: every query fails.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        service(db).record_click(PropertyType::Shop).await;
    }
}
