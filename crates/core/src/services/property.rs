//! Property listing service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use estate_common::{AppError, AppResult, IdGenerator, UploadedFile};
use estate_db::entities::property::{ListingType, PropertyHighlight, PropertyStatus, PropertyType};
use estate_db::entities::{property, property_image, property_video};
use estate_db::repositories::{PropertyFilter, PropertyRepository};
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use validator::Validate;

use super::analytics::AnalyticsService;
use super::media::{MediaService, UploadFile};
use super::pagination::{Page, PageRequest};
use super::slug::{resolve_unique_slug, slugify};
use super::upload::Uploader;
use super::validation::{not_blank, validate_phone};

/// Storage folder for listing images.
pub const IMAGE_FOLDER: &str = "properties/images";
/// Storage folder for listing videos.
pub const VIDEO_FOLDER: &str = "properties/videos";
/// Default number of featured listings.
pub const DEFAULT_FEATURED_LIMIT: u64 = 8;
/// Default number of similar listings.
pub const DEFAULT_SIMILAR_LIMIT: u64 = 4;

/// Fields of a new listing.
#[derive(Debug, Clone, Validate)]
pub struct PropertyInput {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    #[validate(custom(function = "not_blank"))]
    pub address: String,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub city: String,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub state: String,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(url)]
    pub map_link: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(exclusive_min = 0.0))]
    pub area: Option<f64>,
    pub built_year: Option<i32>,
    pub floor: Option<i32>,
    #[validate(range(min = 0))]
    pub total_floors: Option<i32>,
    pub amenities: AmenityFlags,
    pub status: PropertyStatus,
    pub highlight: Option<PropertyHighlight>,
    pub is_active: bool,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

/// Amenity flags of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmenityFlags {
    pub furnished: bool,
    pub parking: bool,
    pub balcony: bool,
    pub garden: bool,
    pub swimming: bool,
    pub gym: bool,
    pub security: bool,
    pub elevator: bool,
    pub power_backup: bool,
}

/// Partial update of a listing. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct PropertyUpdate {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    #[validate(custom(function = "not_blank"))]
    pub address: Option<String>,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub city: Option<String>,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(url)]
    pub map_link: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(exclusive_min = 0.0))]
    pub area: Option<f64>,
    pub built_year: Option<i32>,
    pub floor: Option<i32>,
    #[validate(range(min = 0))]
    pub total_floors: Option<i32>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub balcony: Option<bool>,
    pub garden: Option<bool>,
    pub swimming: Option<bool>,
    pub gym: Option<bool>,
    pub security: Option<bool>,
    pub elevator: Option<bool>,
    pub power_backup: Option<bool>,
    pub status: Option<PropertyStatus>,
    pub highlight: Option<PropertyHighlight>,
    pub is_active: Option<bool>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

/// Files sent with a create or update request.
#[derive(Debug, Clone, Default)]
pub struct PropertyMedia {
    pub main_image: Option<UploadFile>,
    pub images: Vec<UploadFile>,
    pub videos: Vec<UploadFile>,
}

impl PropertyMedia {
    fn check_types(&self) -> AppResult<()> {
        if let Some(main) = &self.main_image {
            MediaService::ensure_image(main)?;
        }
        self.images.iter().try_for_each(MediaService::ensure_image)?;
        self.videos.iter().try_for_each(MediaService::ensure_video)
    }
}

/// A listing with its gallery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: property::Model,
    pub images: Vec<property_image::Model>,
    pub videos: Vec<property_video::Model>,
}

/// Short description of a listing attached to inquiries and reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub city: String,
    pub price: f64,
    pub main_image_url: String,
}

impl From<&property::Model> for PropertySummary {
    fn from(p: &property::Model) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            city: p.city.clone(),
            price: p.price,
            main_image_url: p.main_image_url.clone(),
        }
    }
}

/// Listing counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub total_views: i64,
    pub total_clicks: i64,
}

/// Objects uploaded for one request, removed again if the request fails.
#[derive(Default)]
struct UploadBatch {
    main_image: Option<UploadedFile>,
    images: Vec<UploadedFile>,
    videos: Vec<UploadedFile>,
}

impl UploadBatch {
    fn keys(&self) -> Vec<String> {
        self.main_image
            .iter()
            .chain(&self.images)
            .chain(&self.videos)
            .map(|f| f.key.clone())
            .collect()
    }
}

/// Service for managing property listings.
#[derive(Clone)]
pub struct PropertyService {
    property_repo: PropertyRepository,
    uploader: Uploader,
    analytics: AnalyticsService,
    id_gen: IdGenerator,
}

impl PropertyService {
    /// Create a new property service.
    #[must_use]
    pub const fn new(
        property_repo: PropertyRepository,
        uploader: Uploader,
        analytics: AnalyticsService,
    ) -> Self {
        Self {
            property_repo,
            uploader,
            analytics,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Queries ====================

    /// Search active listings.
    pub async fn list_public(
        &self,
        mut filter: PropertyFilter,
        page: PageRequest,
    ) -> AppResult<Page<property::Model>> {
        filter.is_active = Some(true);
        self.list_admin(&filter, page).await
    }

    /// Search all listings, active or not unless the filter says otherwise.
    pub async fn list_admin(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> AppResult<Page<property::Model>> {
        let (items, total) = self
            .property_repo
            .search(filter, page.offset(), page.limit)
            .await?;
        Ok(Page::new(items, total, page))
    }

    async fn find_by_id_or_slug(&self, id_or_slug: &str) -> AppResult<Option<property::Model>> {
        if IdGenerator::is_id(id_or_slug)
            && let Some(found) = self.property_repo.find_by_id(id_or_slug).await?
        {
            return Ok(Some(found));
        }
        self.property_repo.find_by_slug(id_or_slug).await
    }

    async fn with_media(&self, property: property::Model) -> AppResult<PropertyDetail> {
        let images = self.property_repo.find_images(&property.id).await?;
        let videos = self.property_repo.find_videos(&property.id).await?;
        Ok(PropertyDetail {
            property,
            images,
            videos,
        })
    }

    /// Get any listing by ID or slug, without counting a view.
    pub async fn get_detail(&self, id_or_slug: &str) -> AppResult<PropertyDetail> {
        let property = self
            .find_by_id_or_slug(id_or_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {id_or_slug}")))?;
        self.with_media(property).await
    }

    /// Get an active listing by ID or slug and count the view.
    pub async fn get_public(&self, id_or_slug: &str) -> AppResult<PropertyDetail> {
        let mut property = self
            .find_by_id_or_slug(id_or_slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {id_or_slug}")))?;

        match self.property_repo.increment_view_count(&property.id).await {
            Ok(()) => property.view_count += 1,
            Err(e) => {
                tracing::warn!(property_id = %property.id, error = %e, "Failed to count property view");
            }
        }
        self.analytics.record_view(property.property_type).await;

        self.with_media(property).await
    }

    /// Count a click on an active listing (contact button, phone reveal, ...).
    pub async fn record_click(&self, id: &str) -> AppResult<()> {
        let property = self
            .property_repo
            .find_by_id(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {id}")))?;

        if let Err(e) = self.property_repo.increment_click_count(id).await {
            tracing::warn!(property_id = %id, error = %e, "Failed to count property click");
        }
        self.analytics.record_click(property.property_type).await;
        Ok(())
    }

    /// Active listings with a highlight.
    pub async fn featured(
        &self,
        highlight: Option<PropertyHighlight>,
        limit: Option<u64>,
    ) -> AppResult<Vec<property::Model>> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).clamp(1, 50);
        self.property_repo.find_featured(highlight, limit).await
    }

    /// Active listings of the same type in the same city.
    pub async fn similar(&self, id: &str, limit: Option<u64>) -> AppResult<Vec<property::Model>> {
        let property = self.property_repo.get_by_id(id).await?;
        let limit = limit.unwrap_or(DEFAULT_SIMILAR_LIMIT).clamp(1, 20);
        self.property_repo.find_similar(&property, limit).await
    }

    /// Admin statistics.
    pub async fn stats(&self) -> AppResult<PropertyStats> {
        let total = self.property_repo.count(None).await?;
        let active = self.property_repo.count(Some(true)).await?;
        let by_status = self.property_repo.count_by_status().await?;
        let by_type = self.property_repo.stats_by_type().await?;
        let (total_views, total_clicks) = self.property_repo.counter_totals().await?;

        Ok(PropertyStats {
            total,
            active,
            inactive: total.saturating_sub(active),
            by_status: by_status.into_iter().collect(),
            by_type: by_type
                .into_iter()
                .map(|t| (t.property_type, t.count))
                .collect(),
            total_views,
            total_clicks,
        })
    }

    // ==================== Writes ====================

    async fn unique_slug(&self, title: &str, exclude_id: Option<&str>) -> AppResult<String> {
        let base = slugify(title);
        let taken = self
            .property_repo
            .find_slugs_with_prefix(&base, exclude_id)
            .await?;
        Ok(resolve_unique_slug(&base, taken))
    }

    async fn upload(&self, media: &PropertyMedia) -> AppResult<UploadBatch> {
        let mut batch = UploadBatch::default();

        if let Some(main) = &media.main_image {
            batch.main_image = Some(self.uploader.upload_image(IMAGE_FOLDER, main).await?);
        }

        match self.uploader.upload_images(IMAGE_FOLDER, &media.images).await {
            Ok(images) => batch.images = images,
            Err(e) => {
                self.uploader.delete_keys(batch.keys()).await;
                return Err(e);
            }
        }

        match self.uploader.upload_videos(VIDEO_FOLDER, &media.videos).await {
            Ok(videos) => batch.videos = videos,
            Err(e) => {
                self.uploader.delete_keys(batch.keys()).await;
                return Err(e);
            }
        }

        Ok(batch)
    }

    fn gallery_rows(
        &self,
        property_id: &str,
        batch: &UploadBatch,
        first_image_order: i32,
        first_video_order: i32,
        now: DateTime<Utc>,
    ) -> (Vec<property_image::Model>, Vec<property_video::Model>) {
        let images = batch
            .images
            .iter()
            .zip(first_image_order..)
            .map(|(file, order)| property_image::Model {
                id: self.id_gen.generate(),
                property_id: property_id.to_string(),
                url: file.url.clone(),
                caption: None,
                order,
                created_at: now,
            })
            .collect();

        let videos = batch
            .videos
            .iter()
            .zip(first_video_order..)
            .map(|(file, order)| property_video::Model {
                id: self.id_gen.generate(),
                property_id: property_id.to_string(),
                url: file.url.clone(),
                title: None,
                order,
                created_at: now,
            })
            .collect();

        (images, videos)
    }

    /// Create a listing. A main image is required; images are recompressed,
    /// videos stored as-is. Row writes happen in one transaction and uploaded
    /// objects are removed again if it fails.
    pub async fn create(
        &self,
        input: PropertyInput,
        media: PropertyMedia,
    ) -> AppResult<PropertyDetail> {
        input.validate()?;
        if media.main_image.is_none() {
            return Err(AppError::BadRequest("Main image is required".to_string()));
        }
        media.check_types()?;

        let slug = self.unique_slug(&input.title, None).await?;
        let batch = self.upload(&media).await?;
        let main_image_url = batch
            .main_image
            .as_ref()
            .map(|f| f.url.clone())
            .unwrap_or_default();

        let id = self.id_gen.generate();
        let now = Utc::now();
        let (images, videos) = self.gallery_rows(&id, &batch, 0, 0, now);
        let a = input.amenities;

        let model = property::ActiveModel {
            id: Set(id.clone()),
            title: Set(input.title),
            slug: Set(slug),
            description: Set(input.description),
            price: Set(input.price),
            property_type: Set(input.property_type),
            listing_type: Set(input.listing_type),
            address: Set(input.address),
            city: Set(input.city),
            state: Set(input.state),
            pincode: Set(input.pincode),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            map_link: Set(input.map_link),
            bedrooms: Set(input.bedrooms),
            bathrooms: Set(input.bathrooms),
            area: Set(input.area),
            built_year: Set(input.built_year),
            floor: Set(input.floor),
            total_floors: Set(input.total_floors),
            furnished: Set(a.furnished),
            parking: Set(a.parking),
            balcony: Set(a.balcony),
            garden: Set(a.garden),
            swimming: Set(a.swimming),
            gym: Set(a.gym),
            security: Set(a.security),
            elevator: Set(a.elevator),
            power_backup: Set(a.power_backup),
            status: Set(input.status),
            highlight: Set(input.highlight),
            main_image_url: Set(main_image_url),
            is_active: Set(input.is_active),
            view_count: Set(0),
            click_count: Set(0),
            contact_name: Set(input.contact_name),
            contact_phone: Set(input.contact_phone),
            contact_email: Set(input.contact_email),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = match self
            .property_repo
            .create_with_media(model, image_rows(&images), video_rows(&videos))
            .await
        {
            Ok(created) => created,
            Err(e) => {
                self.uploader.delete_keys(batch.keys()).await;
                return Err(e);
            }
        };

        tracing::info!(
            property_id = %created.id,
            slug = %created.slug,
            images = images.len(),
            videos = videos.len(),
            "Property created"
        );

        self.analytics
            .record_new_property(created.property_type)
            .await;

        Ok(PropertyDetail {
            property: created,
            images,
            videos,
        })
    }

    /// Update a listing. New gallery files are appended after the existing
    /// ones; a new main image replaces the old object.
    pub async fn update(
        &self,
        id: &str,
        input: PropertyUpdate,
        media: PropertyMedia,
    ) -> AppResult<PropertyDetail> {
        input.validate()?;
        media.check_types()?;

        let existing = self.property_repo.get_by_id(id).await?;

        let slug = match &input.title {
            Some(title) if *title != existing.title => Some(self.unique_slug(title, Some(id)).await?),
            _ => None,
        };

        let current_images = self.property_repo.find_images(id).await?;
        let current_videos = self.property_repo.find_videos(id).await?;
        let next_image_order = current_images.iter().map(|i| i.order + 1).max().unwrap_or(0);
        let next_video_order = current_videos.iter().map(|v| v.order + 1).max().unwrap_or(0);

        let batch = self.upload(&media).await?;
        let now = Utc::now();
        let (new_images, new_videos) =
            self.gallery_rows(id, &batch, next_image_order, next_video_order, now);

        let old_main_image = existing.main_image_url.clone();
        let mut active: property::ActiveModel = existing.into();

        macro_rules! apply {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = input.$field {
                    active.$field = Set(value);
                })+
            };
        }
        macro_rules! apply_nullable {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = input.$field {
                    active.$field = Set(Some(value));
                })+
            };
        }

        apply!(
            title, description, price, property_type, listing_type, address, city, state,
            furnished, parking, balcony, garden, swimming, gym, security, elevator,
            power_backup, status, is_active,
        );
        apply_nullable!(
            pincode, latitude, longitude, map_link, bedrooms, bathrooms, area, built_year,
            floor, total_floors, highlight, contact_name, contact_phone, contact_email,
        );

        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(main) = &batch.main_image {
            active.main_image_url = Set(main.url.clone());
        }
        active.updated_at = Set(now);

        let updated = match self
            .property_repo
            .update_with_media(active, image_rows(&new_images), video_rows(&new_videos))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.uploader.delete_keys(batch.keys()).await;
                return Err(e);
            }
        };

        if batch.main_image.is_some() {
            self.uploader.delete_urls([old_main_image]).await;
        }

        tracing::info!(property_id = %id, "Property updated");

        Ok(PropertyDetail {
            property: updated,
            images: current_images.into_iter().chain(new_images).collect(),
            videos: current_videos.into_iter().chain(new_videos).collect(),
        })
    }

    /// Delete a listing and, afterwards, all of its stored objects.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let property = self.property_repo.get_by_id(id).await?;
        let images = self.property_repo.find_images(id).await?;
        let videos = self.property_repo.find_videos(id).await?;

        if self.property_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("Property not found: {id}")));
        }

        let urls = std::iter::once(property.main_image_url)
            .chain(images.into_iter().map(|i| i.url))
            .chain(videos.into_iter().map(|v| v.url));
        self.uploader.delete_urls(urls).await;

        tracing::info!(property_id = %id, "Property deleted");
        Ok(())
    }

    /// Delete one gallery image.
    pub async fn delete_image(&self, property_id: &str, image_id: &str) -> AppResult<()> {
        let image = self
            .property_repo
            .find_image(property_id, image_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image not found: {image_id}")))?;

        self.property_repo.delete_image(&image.id).await?;
        self.uploader.delete_urls([image.url]).await;
        Ok(())
    }

    /// Delete one video.
    pub async fn delete_video(&self, property_id: &str, video_id: &str) -> AppResult<()> {
        let video = self
            .property_repo
            .find_video(property_id, video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {video_id}")))?;

        self.property_repo.delete_video(&video.id).await?;
        self.uploader.delete_urls([video.url]).await;
        Ok(())
    }

    /// Set the market status of a listing.
    pub async fn update_status(&self, id: &str, status: PropertyStatus) -> AppResult<property::Model> {
        let existing = self.property_repo.get_by_id(id).await?;
        let mut active: property::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        self.property_repo.update(active).await
    }

    /// Flip the public visibility of a listing.
    pub async fn toggle_active(&self, id: &str) -> AppResult<property::Model> {
        let existing = self.property_repo.get_by_id(id).await?;
        let is_active = !existing.is_active;
        let mut active: property::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        self.property_repo.update(active).await
    }

    /// Set the status of many listings. Returns the number of rows changed.
    pub async fn bulk_status(&self, ids: &[String], status: PropertyStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::BadRequest(
                "propertyIds must not be empty".to_string(),
            ));
        }
        let affected = self.property_repo.update_status_many(ids, status).await?;
        tracing::info!(requested = ids.len(), affected, "Bulk property status update");
        Ok(affected)
    }
}

fn image_rows(images: &[property_image::Model]) -> Vec<property_image::ActiveModel> {
    images
        .iter()
        .cloned()
        .map(|m| property_image::ActiveModel::from(m).reset_all())
        .collect()
}

fn video_rows(videos: &[property_video::Model]) -> Vec<property_video::ActiveModel> {
    videos
        .iter()
        .cloned()
        .map(|m| property_video::ActiveModel::from(m).reset_all())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::upload::test_support::RecordingStorage;
    use bytes::Bytes;
    use estate_db::repositories::{
        AnalyticsRepository, ExpertiseRepository, InquiryRepository, ReviewRepository,
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::io::Cursor;
    use std::sync::Arc;

    fn service(db: DatabaseConnection, storage: Arc<RecordingStorage>) -> PropertyService {
        shared_service(Arc::new(db), storage)
    }

    fn shared_service(
        db: Arc<DatabaseConnection>,
        storage: Arc<RecordingStorage>,
    ) -> PropertyService {
        let property_repo = PropertyRepository::new(db.clone());
        let analytics = AnalyticsService::new(
            AnalyticsRepository::new(db.clone()),
            property_repo.clone(),
            InquiryRepository::new(db.clone()),
            ExpertiseRepository::new(db.clone()),
            ReviewRepository::new(db),
        );
        PropertyService::new(
            property_repo,
            Uploader::new(storage, MediaService::default()),
            analytics,
        )
    }

    fn png_upload() -> UploadFile {
        let img = RgbImage::from_pixel(32, 24, Rgb([10, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        UploadFile {
            file_name: "front.png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(out.into_inner()),
        }
    }

    fn test_input() -> PropertyInput {
        PropertyInput {
            title: "Sea View Flat".to_string(),
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
            amenities: AmenityFlags {
                parking: true,
                ..Default::default()
            },
            status: PropertyStatus::Available,
            highlight: None,
            is_active: true,
            contact_name: None,
            contact_phone: Some("+91 98765 43210".to_string()),
            contact_email: None,
        }
    }

    fn test_property(id: &str, is_active: bool) -> property::Model {
        let now = Utc::now();
        property::Model {
            id: id.to_string(),
            title: "Sea View Flat".to_string(),
            slug: "sea-view-flat".to_string(),
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
            furnished: false,
            parking: true,
            balcony: false,
            garden: false,
            swimming: false,
            gym: false,
            security: false,
            elevator: false,
            power_backup: false,
            status: PropertyStatus::Available,
            highlight: None,
            main_image_url: "https://cdn.test/properties/images/main.jpg".to_string(),
            is_active,
            view_count: 0,
            click_count: 0,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn slug_rows(slugs: &[&str]) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        slugs
            .iter()
            .map(|s| maplit::btreemap! { "slug" => sea_orm::Value::from(s.to_string()) })
            .collect()
    }

    #[tokio::test]
    async fn test_create_requires_main_image() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db, RecordingStorage::shared());

        let result = service.create(test_input(), PropertyMedia::default()).await;

        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("Main image")));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_price() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db, RecordingStorage::shared());
        let mut input = test_input();
        input.price = 0.0;

        let result = service
            .create(
                input,
                PropertyMedia {
                    main_image: Some(png_upload()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_non_video_upload_before_uploading() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        let result = service
            .create(
                test_input(),
                PropertyMedia {
                    main_image: Some(png_upload()),
                    videos: vec![png_upload()],
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(storage.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_uploads_and_persists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([slug_rows(&[])])
            .append_query_results([[test_property("p1", true)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        let detail = service
            .create(
                test_input(),
                PropertyMedia {
                    main_image: Some(png_upload()),
                    images: vec![png_upload()],
                    videos: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.property.id, "p1");
        assert_eq!(detail.images.len(), 1);
        assert_eq!(detail.images[0].order, 0);
        assert!(detail.images[0].url.starts_with("https://cdn.test/properties/images/"));
        assert_eq!(storage.uploaded.lock().unwrap().len(), 2);
        assert!(storage.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_removes_uploaded_objects() {
        // Slug lookup succeeds, the insert has no mock result and fails.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([slug_rows(&["sea-view-flat"])])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        let result = service
            .create(
                test_input(),
                PropertyMedia {
                    main_image: Some(png_upload()),
                    images: vec![png_upload(), png_upload()],
                    videos: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        let mut uploaded = storage.uploaded.lock().unwrap().clone();
        uploaded.sort();
        assert_eq!(uploaded.len(), 3);
        assert_eq!(storage.deleted(), uploaded);
    }

    fn gallery_image(id: &str, order: i32) -> property_image::Model {
        property_image::Model {
            id: id.to_string(),
            property_id: "p1".to_string(),
            url: format!("https://cdn.test/properties/images/{id}.jpg"),
            caption: None,
            order,
            created_at: Utc::now(),
        }
    }

    fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
        Arc::try_unwrap(db)
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(ToString::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_update_new_title_regenerates_slug_excluding_itself() {
        let mut renamed = test_property("p1", true);
        renamed.title = "Garden Villa".to_string();
        renamed.slug = "garden-villa-1".to_string();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_property("p1", true)]])
                .append_query_results([slug_rows(&["garden-villa"])])
                .append_query_results([Vec::<property_image::Model>::new()])
                .append_query_results([Vec::<property_video::Model>::new()])
                .append_query_results([[renamed]])
                .into_connection(),
        );
        let service = shared_service(db.clone(), RecordingStorage::shared());

        let detail = service
            .update(
                "p1",
                PropertyUpdate {
                    title: Some("Garden Villa".to_string()),
                    ..Default::default()
                },
                PropertyMedia::default(),
            )
            .await
            .unwrap();
        drop(service);

        assert_eq!(detail.property.slug, "garden-villa-1");
        let sql = executed_sql(db);
        let slug_query = sql.iter().find(|q| q.contains("LIKE")).unwrap();
        assert!(slug_query.contains(r#""id" <> 'p1'"#));
        let update = sql.iter().find(|q| q.starts_with("UPDATE")).unwrap();
        assert!(update.contains(r#""slug" = 'garden-villa-1'"#));
    }

    #[tokio::test]
    async fn test_update_same_title_keeps_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_property("p1", true)]])
                .append_query_results([Vec::<property_image::Model>::new()])
                .append_query_results([Vec::<property_video::Model>::new()])
                .append_query_results([[test_property("p1", true)]])
                .into_connection(),
        );
        let service = shared_service(db.clone(), RecordingStorage::shared());

        let detail = service
            .update(
                "p1",
                PropertyUpdate {
                    title: Some("Sea View Flat".to_string()),
                    price: Some(8_000_000.0),
                    ..Default::default()
                },
                PropertyMedia::default(),
            )
            .await
            .unwrap();
        drop(service);

        assert_eq!(detail.property.slug, "sea-view-flat");
        let sql = executed_sql(db);
        assert!(!sql.iter().any(|q| q.contains("LIKE")));
        let update = sql.iter().find(|q| q.starts_with("UPDATE")).unwrap();
        assert!(!update.contains(r#""slug" ="#));
    }

    #[tokio::test]
    async fn test_update_appends_gallery_after_existing_images() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", true)]])
            .append_query_results([[gallery_image("img0", 0), gallery_image("img1", 1)]])
            .append_query_results([Vec::<property_video::Model>::new()])
            .append_query_results([[test_property("p1", true)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        let detail = service
            .update(
                "p1",
                PropertyUpdate::default(),
                PropertyMedia {
                    images: vec![png_upload(), png_upload()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let orders: Vec<i32> = detail.images.iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(detail.images[0].id, "img0");
        assert!(storage.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_main_image_after_commit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", true)]])
            .append_query_results([Vec::<property_image::Model>::new()])
            .append_query_results([Vec::<property_video::Model>::new()])
            .append_query_results([[test_property("p1", true)]])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        service
            .update(
                "p1",
                PropertyUpdate::default(),
                PropertyMedia {
                    main_image: Some(png_upload()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(storage.uploaded.lock().unwrap().len(), 1);
        assert_eq!(
            storage.deleted(),
            vec!["properties/images/main.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_failure_removes_new_uploads_and_keeps_old_main() {
        // No mock result for the UPDATE, so the transaction fails.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", true)]])
            .append_query_results([Vec::<property_image::Model>::new()])
            .append_query_results([Vec::<property_video::Model>::new()])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        let result = service
            .update(
                "p1",
                PropertyUpdate::default(),
                PropertyMedia {
                    main_image: Some(png_upload()),
                    images: vec![png_upload()],
                    videos: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        let mut uploaded = storage.uploaded.lock().unwrap().clone();
        uploaded.sort();
        assert_eq!(uploaded.len(), 2);
        assert_eq!(storage.deleted(), uploaded);
        assert!(!uploaded.contains(&"properties/images/main.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_delete_removes_row_then_objects() {
        let image = property_image::Model {
            id: "img1".to_string(),
            property_id: "p1".to_string(),
            url: "https://cdn.test/properties/images/gallery.jpg".to_string(),
            caption: None,
            order: 0,
            created_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", true)]])
            .append_query_results([[image]])
            .append_query_results([Vec::<property_video::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let storage = RecordingStorage::shared();
        let service = service(db, storage.clone());

        service.delete("p1").await.unwrap();

        assert_eq!(
            storage.deleted(),
            vec![
                "properties/images/gallery.jpg".to_string(),
                "properties/images/main.jpg".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_public_hides_inactive_listing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", false)]])
            .into_connection();
        let service = service(db, RecordingStorage::shared());

        let result = service.get_public("sea-view-flat").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_active_flips_flag() {
        let mut toggled = test_property("p1", false);
        toggled.updated_at = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_property("p1", true)]])
            .append_query_results([[toggled]])
            .into_connection();
        let service = service(db, RecordingStorage::shared());

        let updated = service.toggle_active("p1").await.unwrap();

        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_bulk_status_requires_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(db, RecordingStorage::shared());

        let result = service.bulk_status(&[], PropertyStatus::Sold).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
