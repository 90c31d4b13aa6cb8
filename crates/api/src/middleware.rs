//! Application state and authentication middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use estate_core::{
    AnalyticsService, AuthService, ExpertiseService, InquiryService, PropertyService,
    ReviewService, SidebarService,
};

use crate::multipart::UploadLimits;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub property_service: PropertyService,
    pub inquiry_service: InquiryService,
    pub expertise_service: ExpertiseService,
    pub review_service: ReviewService,
    pub sidebar_service: SidebarService,
    pub analytics_service: AnalyticsService,
    pub auth_service: AuthService,
    pub upload_limits: UploadLimits,
    /// Whether auth cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Access token from the `accessToken` cookie, else from a bearer header.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Authentication middleware. A valid access token puts its claims into the
/// request extensions; anything else leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = access_token(req.headers()) {
        match state.auth_service.verify_access(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid access token"),
        }
    }

    next.run(req).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; accessToken=abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(access_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(access_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));

        assert_eq!(access_token(&headers), None);
        assert_eq!(access_token(&HeaderMap::new()), None);
    }
}
