//! Inquiry endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use estate_common::AppResult;
use estate_core::{CreateInquiryInput, InquiryView, PageRequest, RespondInput, StatusStats};
use estate_db::entities::inquiry::{self, InquiryStatus, InquiryType};
use estate_db::repositories::InquiryFilter;
use serde::{Deserialize, Serialize};

use super::ADMIN_PAGE_SIZE;
use crate::{
    extractors::{AdminUser, JsonBody, QueryParams},
    middleware::AppState,
    response::ApiResponse,
};

/// Admin inquiry list query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<InquiryStatus>,
    pub property_id: Option<String>,
    #[serde(alias = "type")]
    pub inquiry_type: Option<InquiryType>,
    #[serde(alias = "search")]
    pub q: Option<String>,
}

/// Bulk status change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub inquiry_ids: Vec<String>,
    pub status: InquiryStatus,
}

/// Rows changed by a bulk update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub updated_count: u64,
}

/// Submit an inquiry.
async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateInquiryInput>,
) -> AppResult<ApiResponse<inquiry::Model>> {
    let created = state.inquiry_service.create(input).await?;
    Ok(ApiResponse::created(created)
        .with_message("Inquiry submitted successfully. We will get back to you soon."))
}

/// List inquiries.
async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<InquiryQuery>,
) -> AppResult<ApiResponse<Vec<InquiryView>>> {
    let page = PageRequest::new(query.page, query.limit, ADMIN_PAGE_SIZE);
    let filter = InquiryFilter {
        status: query.status,
        property_id: query.property_id,
        inquiry_type: query.inquiry_type,
        q: query.q,
    };
    let result = state.inquiry_service.list(&filter, page).await?;
    Ok(ApiResponse::paginated(result))
}

/// Inquiry counts.
async fn stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<StatusStats>> {
    Ok(ApiResponse::ok(state.inquiry_service.stats().await?))
}

/// Get one inquiry.
async fn show(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<InquiryView>> {
    Ok(ApiResponse::ok(state.inquiry_service.get(&id).await?))
}

/// Change the status or respond.
async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<RespondInput>,
) -> AppResult<ApiResponse<inquiry::Model>> {
    let updated = state.inquiry_service.update(&id, input).await?;
    Ok(ApiResponse::ok(updated).with_message("Inquiry updated successfully"))
}

/// Set the status of many inquiries.
async fn bulk_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BulkStatusRequest>,
) -> AppResult<ApiResponse<BulkUpdateResponse>> {
    let updated_count = state
        .inquiry_service
        .bulk_status(&req.inquiry_ids, req.status)
        .await?;
    Ok(ApiResponse::ok(BulkUpdateResponse { updated_count })
        .with_message(format!("{updated_count} inquiries updated")))
}

/// Delete an inquiry.
async fn remove(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.inquiry_service.delete(&id).await?;
    Ok(ApiResponse::message("Inquiry deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/stats", get(stats))
        .route("/bulk-status", patch(bulk_status))
        .route("/{id}", get(show).patch(update).delete(remove))
}
