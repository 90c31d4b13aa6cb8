//! Property review endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use estate_common::AppResult;
use estate_core::{
    CreateReviewInput, PageRequest, PublicReview, ReviewStats, ReviewStatusInput, ReviewView,
};
use estate_db::entities::property_review::{self, ReviewStatus};
use estate_db::repositories::{RatingSummary, ReviewFilter};
use serde::{Deserialize, Serialize};

use super::ADMIN_PAGE_SIZE;
use crate::{
    extractors::{AdminUser, JsonBody, QueryParams},
    middleware::AppState,
    response::{ApiResponse, Pagination},
};

/// Page query.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Admin list query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<ReviewStatus>,
    pub property_id: Option<String>,
}

/// Bulk moderation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub review_ids: Vec<String>,
    pub status: ReviewStatus,
}

/// Rows changed by a bulk update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub updated_count: u64,
}

/// Approved reviews of a listing with the rating summary.
#[derive(Debug, Serialize)]
pub struct PropertyReviewsResponse {
    pub reviews: Vec<PublicReview>,
    pub summary: RatingSummary,
}

/// Submit a review. It is published after moderation.
async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateReviewInput>,
) -> AppResult<ApiResponse<property_review::Model>> {
    let created = state.review_service.create(input).await?;
    Ok(ApiResponse::created(created)
        .with_message("Review submitted successfully. It will be visible after approval."))
}

/// Approved reviews of one listing.
async fn for_property(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<ApiResponse<PropertyReviewsResponse>> {
    let page = PageRequest::new(query.page, query.limit, estate_core::DEFAULT_PAGE_SIZE);
    let result = state
        .review_service
        .list_for_property(&property_id, page)
        .await?;

    let pagination = Pagination::from(&result.reviews);
    Ok(ApiResponse::ok(PropertyReviewsResponse {
        reviews: result.reviews.items,
        summary: result.summary,
    })
    .with_pagination(pagination))
}

async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ReviewQuery>,
) -> AppResult<ApiResponse<Vec<ReviewView>>> {
    let page = PageRequest::new(query.page, query.limit, ADMIN_PAGE_SIZE);
    let filter = ReviewFilter {
        status: query.status,
        property_id: query.property_id,
    };
    let result = state.review_service.list(&filter, page).await?;
    Ok(ApiResponse::paginated(result))
}

async fn stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ReviewStats>> {
    Ok(ApiResponse::ok(state.review_service.stats().await?))
}

async fn update_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ReviewStatusInput>,
) -> AppResult<ApiResponse<property_review::Model>> {
    let updated = state.review_service.update_status(&id, input).await?;
    Ok(ApiResponse::ok(updated).with_message("Review status updated"))
}

async fn bulk_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BulkStatusRequest>,
) -> AppResult<ApiResponse<BulkUpdateResponse>> {
    let updated_count = state
        .review_service
        .bulk_status(&req.review_ids, req.status)
        .await?;
    Ok(ApiResponse::ok(BulkUpdateResponse { updated_count })
        .with_message(format!("{updated_count} reviews updated")))
}

async fn remove(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.review_service.delete(&id).await?;
    Ok(ApiResponse::message("Review deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/stats", get(stats))
        .route("/bulk-status", patch(bulk_status))
        .route("/property/{property_id}", get(for_property))
        .route("/{id}/status", patch(update_status))
        .route("/{id}", delete(remove))
}
