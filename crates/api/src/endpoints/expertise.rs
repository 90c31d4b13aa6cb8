//! Consultation request endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use estate_common::AppResult;
use estate_core::{CreateExpertiseInput, PageRequest, RespondInput, StatusStats};
use estate_db::entities::expertise_inquiry;
use estate_db::entities::inquiry::InquiryStatus;
use estate_db::repositories::ExpertiseFilter;
use serde::Deserialize;

use super::ADMIN_PAGE_SIZE;
use crate::{
    extractors::{AdminUser, JsonBody, QueryParams},
    middleware::AppState,
    response::ApiResponse,
};

/// Admin list query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertiseQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<InquiryStatus>,
    pub consultation_type: Option<String>,
    #[serde(alias = "search")]
    pub q: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateExpertiseInput>,
) -> AppResult<ApiResponse<expertise_inquiry::Model>> {
    let created = state.expertise_service.create(input).await?;
    Ok(ApiResponse::created(created)
        .with_message("Consultation request submitted successfully. Our expert will contact you soon."))
}

async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ExpertiseQuery>,
) -> AppResult<ApiResponse<Vec<expertise_inquiry::Model>>> {
    let page = PageRequest::new(query.page, query.limit, ADMIN_PAGE_SIZE);
    let filter = ExpertiseFilter {
        status: query.status,
        consultation_type: query.consultation_type,
        q: query.q,
    };
    let result = state.expertise_service.list(&filter, page).await?;
    Ok(ApiResponse::paginated(result))
}

async fn stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<StatusStats>> {
    Ok(ApiResponse::ok(state.expertise_service.stats().await?))
}

async fn show(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<expertise_inquiry::Model>> {
    Ok(ApiResponse::ok(state.expertise_service.get(&id).await?))
}

async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<RespondInput>,
) -> AppResult<ApiResponse<expertise_inquiry::Model>> {
    let updated = state.expertise_service.update(&id, input).await?;
    Ok(ApiResponse::ok(updated).with_message("Consultation request updated successfully"))
}

async fn remove(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.expertise_service.delete(&id).await?;
    Ok(ApiResponse::message("Consultation request deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/stats", get(stats))
        .route("/{id}", get(show).patch(update).delete(remove))
}
