//! HTTP API layer for the estate backend.
//!
//! - **Endpoints**: public listing, inquiry and review routes plus the admin API
//! - **Extractors**: admin authentication, JSON and query parsing
//! - **Middleware**: access token verification from cookie or bearer header
//! - **Multipart**: form parsing with upload limits
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use multipart::UploadLimits;
