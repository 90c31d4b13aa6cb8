//! Admin authentication endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bytes::Bytes;
use estate_common::{AppError, AppResult};
use estate_core::{ChangePasswordInput, LoginInput, RegisterInput};
use estate_db::entities::admin;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, JsonBody, MaybeAdmin},
    middleware::{ACCESS_TOKEN_COOKIE, AppState, REFRESH_TOKEN_COOKIE},
    response::ApiResponse,
};

/// Login result. Tokens are also set as cookies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub admin: admin::Model,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Refresh request. The token may come from the body or the cookie.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// New access token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Create an admin account. Only the first account can be created anonymously.
async fn register(
    MaybeAdmin(actor): MaybeAdmin,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<ApiResponse<admin::Model>> {
    let created = state.auth_service.register(input, actor.as_ref()).await?;
    Ok(ApiResponse::created(created).with_message("Admin registered successfully"))
}

/// Sign in and receive tokens.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let session = state.auth_service.login(input).await?;
    let tokens = session.tokens;

    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            state.cookie_secure,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            state.cookie_secure,
        ));

    let response = LoginResponse {
        admin: session.admin,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.access_expires_in,
    };
    Ok((jar, ApiResponse::ok(response).with_message("Login successful")))
}

/// Exchange a refresh token for a new access token.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, ApiResponse<RefreshResponse>)> {
    let request: RefreshRequest = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let token = request
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Refresh token required".to_string()))?;

    let access_token = state.auth_service.refresh(&token).await?;
    let jar = jar.add(auth_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token.clone(),
        state.cookie_secure,
    ));
    Ok((jar, ApiResponse::ok(RefreshResponse { access_token })))
}

/// Clear the auth cookies.
async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<()>) {
    let jar = jar
        .remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"));
    (jar, ApiResponse::message("Logged out successfully"))
}

/// The signed in admin.
async fn me(
    AdminUser(claims): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<admin::Model>> {
    Ok(ApiResponse::ok(state.auth_service.me(&claims).await?))
}

/// Change the signed in admin's password.
async fn change_password(
    AdminUser(claims): AdminUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ChangePasswordInput>,
) -> AppResult<ApiResponse<()>> {
    state.auth_service.change_password(&claims.sub, input).await?;
    Ok(ApiResponse::message("Password changed successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", put(change_password))
}
