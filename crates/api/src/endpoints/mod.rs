//! API endpoints.

mod admin;
mod analytics;
mod expertise;
mod inquiries;
mod properties;
mod reviews;
mod sidebar;

use axum::Router;

use crate::middleware::AppState;

/// Default page size of admin lists.
const ADMIN_PAGE_SIZE: u64 = 20;

/// Create the API router. Mounted under `/api` by the server.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/properties", properties::router())
        .nest("/inquiries", inquiries::router())
        .nest("/expertise", expertise::router())
        .nest("/reviews", reviews::router())
        .nest("/sidebar", sidebar::router())
        .nest("/analytics", analytics::router())
        .nest("/admin", admin::router())
}
