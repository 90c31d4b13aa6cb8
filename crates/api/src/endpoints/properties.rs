//! Property listing endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, patch, post},
};
use estate_common::{AppError, AppResult};
use estate_core::{
    AmenityFlags, PageRequest, PropertyDetail, PropertyInput, PropertyMedia, PropertyStats,
    PropertyUpdate,
};
use estate_db::entities::property::{
    self, ListingType, PropertyHighlight, PropertyStatus, PropertyType,
};
use estate_db::repositories::{Amenity, PropertyFilter, PropertySortField, SortOrder};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, JsonBody, QueryParams},
    middleware::AppState,
    multipart::FormData,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Listing search query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(alias = "search")]
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub status: Option<PropertyStatus>,
    pub highlight: Option<PropertyHighlight>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(alias = "bedrooms")]
    pub min_bedrooms: Option<i32>,
    #[serde(alias = "bathrooms")]
    pub min_bathrooms: Option<i32>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    /// Comma separated amenity names, e.g. `parking,gym`.
    pub amenities: Option<String>,
    /// Admin list only.
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_by: PropertySortField,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl PropertyQuery {
    fn into_filter(self) -> AppResult<(PropertyFilter, PageRequest)> {
        let page = PageRequest::new(self.page, self.limit, estate_core::DEFAULT_PAGE_SIZE);
        let amenities = self
            .amenities
            .as_deref()
            .map(parse_amenities)
            .transpose()?
            .unwrap_or_default();

        let filter = PropertyFilter {
            q: self.q,
            city: self.city,
            state: self.state,
            property_type: self.property_type,
            listing_type: self.listing_type,
            status: self.status,
            highlight: self.highlight,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            min_bathrooms: self.min_bathrooms,
            min_area: self.min_area,
            max_area: self.max_area,
            amenities,
            is_active: self.is_active,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        };
        Ok((filter, page))
    }
}

fn parse_amenities(list: &str) -> AppResult<Vec<Amenity>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| match name.to_ascii_lowercase().replace('_', "").as_str() {
            "furnished" => Ok(Amenity::Furnished),
            "parking" => Ok(Amenity::Parking),
            "balcony" => Ok(Amenity::Balcony),
            "garden" => Ok(Amenity::Garden),
            "swimming" | "swimmingpool" => Ok(Amenity::Swimming),
            "gym" => Ok(Amenity::Gym),
            "security" => Ok(Amenity::Security),
            "elevator" | "lift" => Ok(Amenity::Elevator),
            "powerbackup" => Ok(Amenity::PowerBackup),
            _ => Err(AppError::BadRequest(format!("Unknown amenity: {name}"))),
        })
        .collect()
}

/// Featured listings query.
#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub highlight: Option<PropertyHighlight>,
    pub limit: Option<u64>,
}

/// Limit-only query.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: PropertyStatus,
}

/// Bulk status change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub property_ids: Vec<String>,
    pub status: PropertyStatus,
}

/// Rows changed by a bulk update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub updated_count: u64,
}

// ==================== Form Parsing ====================

fn required<T>(value: Option<T>, name: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn property_input(form: &FormData) -> AppResult<PropertyInput> {
    Ok(PropertyInput {
        title: form.required("title")?,
        description: form.required("description")?,
        price: required(form.parse("price")?, "price")?,
        property_type: required(form.enum_value("propertyType")?, "propertyType")?,
        listing_type: required(form.enum_value("listingType")?, "listingType")?,
        address: form.required("address")?,
        city: form.required("city")?,
        state: form.required("state")?,
        pincode: form.string("pincode"),
        latitude: form.parse("latitude")?,
        longitude: form.parse("longitude")?,
        map_link: form.string("mapLink"),
        bedrooms: form.parse("bedrooms")?,
        bathrooms: form.parse("bathrooms")?,
        area: form.parse("area")?,
        built_year: form.parse("builtYear")?,
        floor: form.parse("floor")?,
        total_floors: form.parse("totalFloors")?,
        amenities: AmenityFlags {
            furnished: form.bool("furnished")?.unwrap_or(false),
            parking: form.bool("parking")?.unwrap_or(false),
            balcony: form.bool("balcony")?.unwrap_or(false),
            garden: form.bool("garden")?.unwrap_or(false),
            swimming: form.bool("swimming")?.unwrap_or(false),
            gym: form.bool("gym")?.unwrap_or(false),
            security: form.bool("security")?.unwrap_or(false),
            elevator: form.bool("elevator")?.unwrap_or(false),
            power_backup: form.bool("powerBackup")?.unwrap_or(false),
        },
        status: form.enum_value("status")?.unwrap_or_default(),
        highlight: form.enum_value("highlight")?,
        is_active: form.bool("isActive")?.unwrap_or(true),
        contact_name: form.string("contactName"),
        contact_phone: form.string("contactPhone"),
        contact_email: form.string("contactEmail"),
    })
}

fn property_update(form: &FormData) -> AppResult<PropertyUpdate> {
    Ok(PropertyUpdate {
        title: form.string("title"),
        description: form.string("description"),
        price: form.parse("price")?,
        property_type: form.enum_value("propertyType")?,
        listing_type: form.enum_value("listingType")?,
        address: form.string("address"),
        city: form.string("city"),
        state: form.string("state"),
        pincode: form.string("pincode"),
        latitude: form.parse("latitude")?,
        longitude: form.parse("longitude")?,
        map_link: form.string("mapLink"),
        bedrooms: form.parse("bedrooms")?,
        bathrooms: form.parse("bathrooms")?,
        area: form.parse("area")?,
        built_year: form.parse("builtYear")?,
        floor: form.parse("floor")?,
        total_floors: form.parse("totalFloors")?,
        furnished: form.bool("furnished")?,
        parking: form.bool("parking")?,
        balcony: form.bool("balcony")?,
        garden: form.bool("garden")?,
        swimming: form.bool("swimming")?,
        gym: form.bool("gym")?,
        security: form.bool("security")?,
        elevator: form.bool("elevator")?,
        power_backup: form.bool("powerBackup")?,
        status: form.enum_value("status")?,
        highlight: form.enum_value("highlight")?,
        is_active: form.bool("isActive")?,
        contact_name: form.string("contactName"),
        contact_phone: form.string("contactPhone"),
        contact_email: form.string("contactEmail"),
    })
}

fn property_media(form: &mut FormData) -> PropertyMedia {
    PropertyMedia {
        main_image: form.take_file("mainImage"),
        images: form.take_files("images"),
        videos: form.take_files("videos"),
    }
}

// ==================== Public Handlers ====================

/// Search active listings.
async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PropertyQuery>,
) -> AppResult<ApiResponse<Vec<property::Model>>> {
    let (filter, page) = query.into_filter()?;
    let result = state.property_service.list_public(filter, page).await?;
    Ok(ApiResponse::paginated(result))
}

/// Highlighted listings.
async fn featured(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FeaturedQuery>,
) -> AppResult<ApiResponse<Vec<property::Model>>> {
    let items = state
        .property_service
        .featured(query.highlight, query.limit)
        .await?;
    Ok(ApiResponse::ok(items))
}

/// Listing detail by ID or slug. Counts a view.
async fn show(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> AppResult<ApiResponse<PropertyDetail>> {
    let detail = state.property_service.get_public(&id_or_slug).await?;
    Ok(ApiResponse::ok(detail))
}

/// Listings like this one.
async fn similar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> AppResult<ApiResponse<Vec<property::Model>>> {
    let items = state.property_service.similar(&id, query.limit).await?;
    Ok(ApiResponse::ok(items))
}

/// Count a click on a listing.
async fn click(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.property_service.record_click(&id).await?;
    Ok(ApiResponse::message("Click recorded"))
}

// ==================== Admin Handlers ====================

/// Search all listings.
async fn admin_list(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PropertyQuery>,
) -> AppResult<ApiResponse<Vec<property::Model>>> {
    let (filter, page) = query.into_filter()?;
    let result = state.property_service.list_admin(&filter, page).await?;
    Ok(ApiResponse::paginated(result))
}

/// Listing statistics.
async fn admin_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PropertyStats>> {
    Ok(ApiResponse::ok(state.property_service.stats().await?))
}

/// Create a listing from a multipart form.
async fn create(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<PropertyDetail>> {
    let mut form = FormData::from_multipart(multipart, &state.upload_limits).await?;
    let media = property_media(&mut form);
    if media.main_image.is_none() {
        return Err(AppError::BadRequest("Main image is required".to_string()));
    }
    let input = property_input(&form)?;

    let detail = state.property_service.create(input, media).await?;
    tracing::info!(admin_id = %admin.sub, property_id = %detail.property.id, "Listing created by admin");
    Ok(ApiResponse::created(detail).with_message("Property created successfully"))
}

/// Update a listing from a multipart form.
async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<PropertyDetail>> {
    let mut form = FormData::from_multipart(multipart, &state.upload_limits).await?;
    let media = property_media(&mut form);
    let input = property_update(&form)?;

    let detail = state.property_service.update(&id, input, media).await?;
    Ok(ApiResponse::ok(detail).with_message("Property updated successfully"))
}

/// Delete a listing and its media.
async fn remove(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.property_service.delete(&id).await?;
    Ok(ApiResponse::message("Property deleted successfully"))
}

/// Set the status of a listing.
async fn update_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<StatusRequest>,
) -> AppResult<ApiResponse<property::Model>> {
    let updated = state.property_service.update_status(&id, req.status).await?;
    Ok(ApiResponse::ok(updated).with_message("Property status updated"))
}

/// Flip the active flag of a listing.
async fn toggle_active(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<property::Model>> {
    let updated = state.property_service.toggle_active(&id).await?;
    let message = if updated.is_active {
        "Property activated"
    } else {
        "Property deactivated"
    };
    Ok(ApiResponse::ok(updated).with_message(message))
}

/// Set the status of many listings.
async fn bulk_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BulkStatusRequest>,
) -> AppResult<ApiResponse<BulkUpdateResponse>> {
    let updated_count = state
        .property_service
        .bulk_status(&req.property_ids, req.status)
        .await?;
    Ok(ApiResponse::ok(BulkUpdateResponse { updated_count })
        .with_message(format!("{updated_count} properties updated")))
}

/// Remove one gallery image.
async fn delete_image(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state.property_service.delete_image(&id, &image_id).await?;
    Ok(ApiResponse::message("Image deleted successfully"))
}

/// Remove one video.
async fn delete_video(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state.property_service.delete_video(&id, &video_id).await?;
    Ok(ApiResponse::message("Video deleted successfully"))
}

// ==================== Router ====================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/featured", get(featured))
        .route("/admin/all", get(admin_list))
        .route("/admin/stats", get(admin_stats))
        .route("/bulk-status", patch(bulk_status))
        .route("/{id}", get(show).put(update).delete(remove))
        .route("/{id}/similar", get(similar))
        .route("/{id}/click", post(click))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/toggle-active", patch(toggle_active))
        .route("/{id}/images/{image_id}", delete(delete_image))
        .route("/{id}/videos/{video_id}", delete(delete_video))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_form() -> FormData {
        FormData::from_fields([
            ("title", "Sea View Flat"),
            ("description", "Two bedroom flat facing the sea"),
            ("price", "7500000"),
            ("propertyType", "APARTMENT"),
            ("listingType", "sale"),
            ("address", "12 Marine Drive"),
            ("city", "Mumbai"),
            ("state", "Maharashtra"),
            ("bedrooms", "2"),
            ("parking", "true"),
            ("highlight", "hot_deal"),
        ])
    }

    #[test]
    fn test_parse_amenities() {
        assert_eq!(
            parse_amenities("parking, gym,power_backup").unwrap(),
            vec![Amenity::Parking, Amenity::Gym, Amenity::PowerBackup]
        );
        assert!(parse_amenities("").unwrap().is_empty());
        assert!(matches!(parse_amenities("helipad"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_property_input_from_form() {
        let input = property_input(&full_form()).unwrap();

        assert_eq!(input.title, "Sea View Flat");
        assert_eq!(input.property_type, PropertyType::Apartment);
        assert_eq!(input.listing_type, ListingType::Sale);
        assert_eq!(input.bedrooms, Some(2));
        assert!(input.amenities.parking);
        assert!(!input.amenities.gym);
        assert_eq!(input.status, PropertyStatus::Available);
        assert_eq!(input.highlight, Some(PropertyHighlight::HotDeal));
        assert!(input.is_active);
    }

    #[test]
    fn test_property_input_requires_price() {
        let form = FormData::from_fields([
            ("title", "Sea View Flat"),
            ("description", "Two bedroom flat"),
            ("propertyType", "APARTMENT"),
            ("listingType", "SALE"),
            ("address", "12 Marine Drive"),
            ("city", "Mumbai"),
            ("state", "Maharashtra"),
        ]);

        let err = property_input(&form).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "price is required"));
    }

    #[test]
    fn test_property_update_keeps_missing_fields() {
        let form = FormData::from_fields([("price", "8000000"), ("isActive", "false")]);

        let update = property_update(&form).unwrap();

        assert_eq!(update.price, Some(8_000_000.0));
        assert_eq!(update.is_active, Some(false));
        assert!(update.title.is_none());
        assert!(update.parking.is_none());
    }

    #[test]
    fn test_query_defaults() {
        let (filter, page) = PropertyQuery::default().into_filter().unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, estate_core::DEFAULT_PAGE_SIZE);
        assert_eq!(filter.sort_by, PropertySortField::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
        assert!(filter.amenities.is_empty());
    }
}
