//! Property repository.

use std::sync::Arc;

use chrono::Utc;
use estate_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::db_err;
use crate::entities::property::{ListingType, PropertyHighlight, PropertyStatus, PropertyType};
use crate::entities::{Property, PropertyImage, PropertyVideo, property, property_image, property_video};

use super::search_any;

/// Column a property listing can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertySortField {
    #[default]
    #[serde(alias = "created_at")]
    CreatedAt,
    Price,
    #[serde(alias = "view_count", alias = "views")]
    ViewCount,
    Area,
}

impl PropertySortField {
    const fn column(self) -> property::Column {
        match self {
            Self::CreatedAt => property::Column::CreatedAt,
            Self::Price => property::Column::Price,
            Self::ViewCount => property::Column::ViewCount,
            Self::Area => property::Column::Area,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// Boolean amenity flags that can be required by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amenity {
    Furnished,
    Parking,
    Balcony,
    Garden,
    Swimming,
    Gym,
    Security,
    Elevator,
    PowerBackup,
}

impl Amenity {
    const fn column(self) -> property::Column {
        match self {
            Self::Furnished => property::Column::Furnished,
            Self::Parking => property::Column::Parking,
            Self::Balcony => property::Column::Balcony,
            Self::Garden => property::Column::Garden,
            Self::Swimming => property::Column::Swimming,
            Self::Gym => property::Column::Gym,
            Self::Security => property::Column::Security,
            Self::Elevator => property::Column::Elevator,
            Self::PowerBackup => property::Column::PowerBackup,
        }
    }
}

/// Search filters for property listings.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    /// Free text matched against title, description, address and city.
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub status: Option<PropertyStatus>,
    pub highlight: Option<PropertyHighlight>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    /// Amenities that must all be present.
    pub amenities: Vec<Amenity>,
    /// `None` includes both active and inactive listings.
    pub is_active: Option<bool>,
    pub sort_by: PropertySortField,
    pub sort_order: SortOrder,
}

impl PropertyFilter {
    /// Build the `WHERE` condition for this filter.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            cond = cond.add(search_any(
                &[
                    property::Column::Title,
                    property::Column::Description,
                    property::Column::Address,
                    property::Column::City,
                ],
                q,
            ));
        }
        if let Some(city) = self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            cond = cond.add(search_any(&[property::Column::City], city));
        }
        if let Some(state) = self.state.as_deref().filter(|s| !s.trim().is_empty()) {
            cond = cond.add(search_any(&[property::Column::State], state));
        }
        if let Some(t) = self.property_type {
            cond = cond.add(property::Column::PropertyType.eq(t));
        }
        if let Some(t) = self.listing_type {
            cond = cond.add(property::Column::ListingType.eq(t));
        }
        if let Some(s) = self.status {
            cond = cond.add(property::Column::Status.eq(s));
        }
        if let Some(h) = self.highlight {
            cond = cond.add(property::Column::Highlight.eq(h));
        }
        if let Some(min) = self.min_price {
            cond = cond.add(property::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            cond = cond.add(property::Column::Price.lte(max));
        }
        if let Some(min) = self.min_bedrooms {
            cond = cond.add(property::Column::Bedrooms.gte(min));
        }
        if let Some(min) = self.min_bathrooms {
            cond = cond.add(property::Column::Bathrooms.gte(min));
        }
        if let Some(min) = self.min_area {
            cond = cond.add(property::Column::Area.gte(min));
        }
        if let Some(max) = self.max_area {
            cond = cond.add(property::Column::Area.lte(max));
        }
        for amenity in &self.amenities {
            cond = cond.add(amenity.column().eq(true));
        }
        if let Some(active) = self.is_active {
            cond = cond.add(property::Column::IsActive.eq(active));
        }

        cond
    }
}

/// Per-type aggregate used by the analytics breakdown.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeStats {
    pub property_type: String,
    pub count: i64,
    pub views: i64,
    pub clicks: i64,
}

#[derive(Debug, FromQueryResult)]
struct CounterTotals {
    views: i64,
    clicks: i64,
}

/// Property repository for database operations.
#[derive(Clone)]
pub struct PropertyRepository {
    db: Arc<DatabaseConnection>,
}

impl PropertyRepository {
    /// Create a new property repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a property by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<property::Model>> {
        Property::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get a property by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<property::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {id}")))
    }

    /// Find a property by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<property::Model>> {
        Property::find()
            .filter(property::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find properties by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<property::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Property::find()
            .filter(property::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Slugs equal to `base` or of the form `{base}-...`, optionally ignoring
    /// one property (the one being renamed).
    pub async fn find_slugs_with_prefix(
        &self,
        base: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let mut query = Property::find()
            .select_only()
            .column(property::Column::Slug)
            .filter(
                Condition::any()
                    .add(property::Column::Slug.eq(base))
                    .add(property::Column::Slug.starts_with(format!("{base}-"))),
            );

        if let Some(id) = exclude_id {
            query = query.filter(property::Column::Id.ne(id));
        }

        query
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Search properties. Returns the requested page and the total match count.
    pub async fn search(
        &self,
        filter: &PropertyFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<property::Model>, u64)> {
        let query = Property::find().filter(filter.condition());

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let items = query
            .order_by(filter.sort_by.column(), filter.sort_order.into())
            .order_by(property::Column::Id, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((items, total))
    }

    /// Active listings carrying a highlight. With `highlight` set, only that tag.
    pub async fn find_featured(
        &self,
        highlight: Option<PropertyHighlight>,
        limit: u64,
    ) -> AppResult<Vec<property::Model>> {
        let mut query = Property::find().filter(property::Column::IsActive.eq(true));

        query = match highlight {
            Some(h) => query.filter(property::Column::Highlight.eq(h)),
            None => query.filter(property::Column::Highlight.is_not_null()),
        };

        query
            .order_by(property::Column::CreatedAt, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Active listings of the same type in the same city, excluding `property`.
    pub async fn find_similar(
        &self,
        property: &property::Model,
        limit: u64,
    ) -> AppResult<Vec<property::Model>> {
        Property::find()
            .filter(property::Column::IsActive.eq(true))
            .filter(property::Column::Id.ne(property.id.as_str()))
            .filter(property::Column::PropertyType.eq(property.property_type))
            .filter(property::Column::City.eq(property.city.as_str()))
            .order_by(property::Column::CreatedAt, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Most viewed listings.
    pub async fn find_top_by_views(&self, limit: u64) -> AppResult<Vec<property::Model>> {
        Property::find()
            .order_by(property::Column::ViewCount, Order::Desc)
            .order_by(property::Column::ClickCount, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert a property together with its gallery in one transaction.
    pub async fn create_with_media(
        &self,
        model: property::ActiveModel,
        images: Vec<property_image::ActiveModel>,
        videos: Vec<property_video::ActiveModel>,
    ) -> AppResult<property::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let created = model.insert(&txn).await.map_err(db_err)?;

        if !images.is_empty() {
            PropertyImage::insert_many(images)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }
        if !videos.is_empty() {
            PropertyVideo::insert_many(videos)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        Ok(created)
    }

    /// Update a property and append new gallery rows in one transaction.
    pub async fn update_with_media(
        &self,
        model: property::ActiveModel,
        images: Vec<property_image::ActiveModel>,
        videos: Vec<property_video::ActiveModel>,
    ) -> AppResult<property::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = model.update(&txn).await.map_err(db_err)?;

        if !images.is_empty() {
            PropertyImage::insert_many(images)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }
        if !videos.is_empty() {
            PropertyVideo::insert_many(videos)
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        Ok(updated)
    }

    /// Update a property.
    pub async fn update(&self, model: property::ActiveModel) -> AppResult<property::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Delete a property. Images and videos go with it via `ON DELETE CASCADE`.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Property::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Set the status of many properties at once.
    pub async fn update_status_many(&self, ids: &[String], status: PropertyStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = Property::update_many()
            .col_expr(property::Column::Status, Expr::value(status))
            .col_expr(property::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(property::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Atomically bump the view counter.
    pub async fn increment_view_count(&self, id: &str) -> AppResult<()> {
        self.increment(id, property::Column::ViewCount).await
    }

    /// Atomically bump the click counter.
    pub async fn increment_click_count(&self, id: &str) -> AppResult<()> {
        self.increment(id, property::Column::ClickCount).await
    }

    async fn increment(&self, id: &str, column: property::Column) -> AppResult<()> {
        Property::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(property::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Gallery images of a property in display order.
    pub async fn find_images(&self, property_id: &str) -> AppResult<Vec<property_image::Model>> {
        PropertyImage::find()
            .filter(property_image::Column::PropertyId.eq(property_id))
            .order_by(property_image::Column::Order, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Videos of a property in display order.
    pub async fn find_videos(&self, property_id: &str) -> AppResult<Vec<property_video::Model>> {
        PropertyVideo::find()
            .filter(property_video::Column::PropertyId.eq(property_id))
            .order_by(property_video::Column::Order, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a gallery image belonging to a property.
    pub async fn find_image(
        &self,
        property_id: &str,
        image_id: &str,
    ) -> AppResult<Option<property_image::Model>> {
        PropertyImage::find_by_id(image_id)
            .filter(property_image::Column::PropertyId.eq(property_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a video belonging to a property.
    pub async fn find_video(
        &self,
        property_id: &str,
        video_id: &str,
    ) -> AppResult<Option<property_video::Model>> {
        PropertyVideo::find_by_id(video_id)
            .filter(property_video::Column::PropertyId.eq(property_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Delete a gallery image row.
    pub async fn delete_image(&self, image_id: &str) -> AppResult<()> {
        PropertyImage::delete_by_id(image_id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Delete a video row.
    pub async fn delete_video(&self, video_id: &str) -> AppResult<()> {
        PropertyVideo::delete_by_id(video_id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Count properties, optionally only active or inactive ones.
    pub async fn count(&self, is_active: Option<bool>) -> AppResult<u64> {
        let mut query = Property::find();
        if let Some(active) = is_active {
            query = query.filter(property::Column::IsActive.eq(active));
        }
        query.count(self.db.as_ref()).await.map_err(db_err)
    }

    /// Count properties grouped by status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(String, i64)>> {
        Property::find()
            .select_only()
            .column(property::Column::Status)
            .column_as(property::Column::Id.count(), "count")
            .group_by(property::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count, views and clicks grouped by property type.
    pub async fn stats_by_type(&self) -> AppResult<Vec<PropertyTypeStats>> {
        Property::find()
            .select_only()
            .column(property::Column::PropertyType)
            .column_as(Expr::cust("COUNT(*)::BIGINT"), "count")
            .column_as(Expr::cust("COALESCE(SUM(view_count), 0)::BIGINT"), "views")
            .column_as(Expr::cust("COALESCE(SUM(click_count), 0)::BIGINT"), "clicks")
            .group_by(property::Column::PropertyType)
            .into_model::<PropertyTypeStats>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Lifetime view and click totals over all listings.
    pub async fn counter_totals(&self) -> AppResult<(i64, i64)> {
        let totals = Property::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(view_count), 0)::BIGINT"), "views")
            .column_as(Expr::cust("COALESCE(SUM(click_count), 0)::BIGINT"), "clicks")
            .into_model::<CounterTotals>()
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(totals.map_or((0, 0), |t| (t.views, t.clicks)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait, Value};

    fn test_property(id: &str, slug: &str) -> property::Model {
        property::Model {
            id: id.to_string(),
            title: "Sea View Flat".to_string(),
            slug: slug.to_string(),
            description: "Two bedroom flat facing the sea".to_string(),
            price: 7_500_000.0,
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            address: "12 Marine Drive".to_string(),
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            pincode: None,
            latitude: None,
            longitude: None,
            map_link: None,
            bedrooms: Some(2),
            bathrooms: Some(2),
            area: Some(950.0),
            built_year: None,
            floor: None,
            total_floors: None,
            furnished: true,
            parking: false,
            balcony: true,
            garden: false,
            swimming: false,
            gym: false,
            security: true,
            elevator: true,
            power_backup: false,
            status: PropertyStatus::Available,
            highlight: None,
            main_image_url: "/uploads/properties/main.jpg".to_string(),
            is_active: true,
            view_count: 0,
            click_count: 0,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_condition_renders_requested_clauses() {
        let filter = PropertyFilter {
            q: Some("sea".to_string()),
            property_type: Some(PropertyType::Villa),
            min_price: Some(100.0),
            amenities: vec![Amenity::Parking, Amenity::Gym],
            is_active: Some(true),
            ..Default::default()
        };

        let sql = Property::find()
            .filter(filter.condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("LOWER(\"title\") LIKE '%sea%'"));
        assert!(sql.contains("\"property_type\" = 'VILLA'"));
        assert!(sql.contains("\"price\" >= 100"));
        assert!(sql.contains("\"parking\" = TRUE"));
        assert!(sql.contains("\"gym\" = TRUE"));
        assert!(sql.contains("\"is_active\" = TRUE"));
        assert!(!sql.contains("\"city\" LIKE"));
    }

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let sql = Property::find()
            .filter(PropertyFilter::default().condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_sort_field_deserializes_both_spellings() {
        let camel: PropertySortField = serde_json::from_str("\"viewCount\"").unwrap();
        let snake: PropertySortField = serde_json::from_str("\"created_at\"").unwrap();
        assert_eq!(camel, PropertySortField::ViewCount);
        assert_eq!(snake, PropertySortField::CreatedAt);
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_property("p1", "sea-view-flat")]])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let found = repo.find_by_slug("sea-view-flat").await.unwrap().unwrap();

        assert_eq!(found.id, "p1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<property::Model>::new()])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_returns_page_and_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(3))
                }]])
                .append_query_results([[
                    test_property("p1", "a"),
                    test_property("p2", "b"),
                ]])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let (items, total) = repo.search(&PropertyFilter::default(), 0, 2).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_find_slugs_with_prefix() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    maplit::btreemap! { "slug" => Value::from("sea-view-flat") },
                    maplit::btreemap! { "slug" => Value::from("sea-view-flat-1") },
                ]])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let slugs = repo.find_slugs_with_prefix("sea-view-flat", None).await.unwrap();

        assert_eq!(slugs, vec!["sea-view-flat", "sea-view-flat-1"]);
    }

    #[tokio::test]
    async fn test_update_status_many_skips_empty_ids() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PropertyRepository::new(db);
        assert_eq!(repo.update_status_many(&[], PropertyStatus::Sold).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_status_many_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        let affected = repo
            .update_status_many(&["p1".to_string(), "p2".to_string()], PropertyStatus::Sold)
            .await
            .unwrap();

        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn test_counter_totals() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "views" => Value::BigInt(Some(40)),
                    "clicks" => Value::BigInt(Some(7)),
                }]])
                .into_connection(),
        );

        let repo = PropertyRepository::new(db);
        assert_eq!(repo.counter_totals().await.unwrap(), (40, 7));
    }
}
