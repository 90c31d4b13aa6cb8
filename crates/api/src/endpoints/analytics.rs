//! Analytics endpoints (admin only).

use axum::{Router, extract::State, routing::get};
use estate_common::AppResult;
use estate_core::{DailyPoint, DashboardOverview, TopProperty};
use estate_db::repositories::PropertyTypeStats;
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, QueryParams},
    middleware::AppState,
    response::ApiResponse,
};

/// Daily series query.
#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

/// Top listings query.
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u64>,
}

async fn dashboard(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardOverview>> {
    Ok(ApiResponse::ok(state.analytics_service.dashboard().await?))
}

async fn daily(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DailyQuery>,
) -> AppResult<ApiResponse<Vec<DailyPoint>>> {
    Ok(ApiResponse::ok(state.analytics_service.daily(query.days).await?))
}

async fn property_types(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PropertyTypeStats>>> {
    Ok(ApiResponse::ok(state.analytics_service.property_types().await?))
}

async fn top_properties(
    _admin: AdminUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TopQuery>,
) -> AppResult<ApiResponse<Vec<TopProperty>>> {
    Ok(ApiResponse::ok(
        state.analytics_service.top_properties(query.limit).await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/daily", get(daily))
        .route("/property-types", get(property_types))
        .route("/top-properties", get(top_properties))
}
