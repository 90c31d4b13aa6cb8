//! Sidebar content endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    routing::{get, patch},
};
use estate_common::AppResult;
use estate_core::{SidebarInput, SidebarMedia};
use estate_db::entities::sidebar_content;

use crate::{
    extractors::AdminUser, middleware::AppState, multipart::FormData, response::ApiResponse,
};

fn sidebar_form(form: &mut FormData) -> AppResult<(SidebarInput, SidebarMedia)> {
    let input = SidebarInput {
        image_url: form.string("imageUrl"),
        video_url: form.string("videoUrl"),
        phone_number: form.string("phoneNumber"),
        whatsapp_number: form.string("whatsappNumber"),
        is_active: form.bool("isActive")?,
    };
    let media = SidebarMedia {
        image: form.take_file("image"),
        video: form.take_file("video"),
    };
    Ok((input, media))
}

/// The content currently shown on the site.
async fn active(State(state): State<AppState>) -> AppResult<ApiResponse<sidebar_content::Model>> {
    Ok(ApiResponse::ok(state.sidebar_service.get_active().await?))
}

async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<sidebar_content::Model>>> {
    Ok(ApiResponse::ok(state.sidebar_service.list().await?))
}

async fn show(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<sidebar_content::Model>> {
    Ok(ApiResponse::ok(state.sidebar_service.get(&id).await?))
}

async fn create(
    _admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<sidebar_content::Model>> {
    let mut form = FormData::from_multipart(multipart, &state.upload_limits).await?;
    let (input, media) = sidebar_form(&mut form)?;

    let created = state.sidebar_service.create(input, media).await?;
    Ok(ApiResponse::created(created).with_message("Sidebar content created successfully"))
}

async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<sidebar_content::Model>> {
    let mut form = FormData::from_multipart(multipart, &state.upload_limits).await?;
    let (input, media) = sidebar_form(&mut form)?;

    let updated = state.sidebar_service.update(&id, input, media).await?;
    Ok(ApiResponse::ok(updated).with_message("Sidebar content updated successfully"))
}

async fn toggle(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<sidebar_content::Model>> {
    let updated = state.sidebar_service.toggle(&id).await?;
    let message = if updated.is_active {
        "Sidebar content activated"
    } else {
        "Sidebar content deactivated"
    };
    Ok(ApiResponse::ok(updated).with_message(message))
}

async fn remove(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.sidebar_service.delete(&id).await?;
    Ok(ApiResponse::message("Sidebar content deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/active", get(active))
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
        .route("/{id}/toggle", patch(toggle))
}
