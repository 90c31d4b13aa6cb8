//! API integration tests.
//!
//! These tests drive the full router, including the auth middleware, against
//! a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    middleware,
};
use chrono::Utc;
use estate_api::{AppState, UploadLimits, auth_middleware, router as api_router};
use estate_common::config::AuthConfig;
use estate_common::{LocalStorage, SharedStorage};
use estate_core::admin::{TokenSettings, TokenType, hash_password};
use estate_core::{
    AnalyticsService, AuthService, EmailService, ExpertiseService, InquiryService, MediaConfig,
    MediaService, PropertyService, ReviewService, SidebarService, Uploader,
};
use estate_db::entities::{admin, sidebar_content};
use estate_db::repositories::{
    AdminRepository, AnalyticsRepository, ExpertiseRepository, InquiryRepository,
    PropertyRepository, ReviewRepository, SidebarRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "estate-test-boundary";

fn auth_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "integration-access-secret".to_string(),
        refresh_token_secret: "integration-refresh-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        cookie_secure: false,
    }
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

/// Create test app state over the given mock database.
fn create_test_state(db: DatabaseConnection, upload_limits: UploadLimits) -> AppState {
    let db = Arc::new(db);

    let property_repo = PropertyRepository::new(Arc::clone(&db));
    let inquiry_repo = InquiryRepository::new(Arc::clone(&db));
    let expertise_repo = ExpertiseRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let sidebar_repo = SidebarRepository::new(Arc::clone(&db));
    let analytics_repo = AnalyticsRepository::new(Arc::clone(&db));
    let admin_repo = AdminRepository::new(Arc::clone(&db));

    let storage: SharedStorage = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("estate-api-tests"),
        "http://localhost/uploads".to_string(),
    ));
    let uploader = Uploader::new(storage, MediaService::new(MediaConfig::default()));
    let email = EmailService::disabled("https://estate.example");

    let analytics_service = AnalyticsService::new(
        analytics_repo,
        property_repo.clone(),
        inquiry_repo.clone(),
        expertise_repo.clone(),
        review_repo.clone(),
    );

    AppState {
        property_service: PropertyService::new(
            property_repo.clone(),
            uploader.clone(),
            analytics_service.clone(),
        ),
        inquiry_service: InquiryService::new(
            inquiry_repo,
            property_repo.clone(),
            analytics_service.clone(),
            email.clone(),
        ),
        expertise_service: ExpertiseService::new(expertise_repo, email.clone()),
        review_service: ReviewService::new(review_repo, property_repo, email),
        sidebar_service: SidebarService::new(sidebar_repo, uploader),
        analytics_service,
        auth_service: AuthService::new(admin_repo, &auth_config()),
        upload_limits,
        cookie_secure: false,
    }
}

/// Create the test router, wired like the server.
fn create_test_router_with(db: DatabaseConnection, upload_limits: UploadLimits) -> Router {
    let state = create_test_state(db, upload_limits);
    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn create_test_router(db: DatabaseConnection) -> Router {
    create_test_router_with(db, UploadLimits::default())
}

fn stored_admin() -> admin::Model {
    admin::Model {
        id: "01hadmin0000000000000000000".to_string(),
        name: "Owner".to_string(),
        email: "owner@estate.example".to_string(),
        password: hash_password("password123").unwrap(),
        last_login_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn bearer(admin: &admin::Model) -> String {
    let token = TokenSettings::from(&auth_config())
        .sign(admin, TokenType::Access)
        .unwrap();
    format!("Bearer {token}")
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with text fields and `(field, file name, content type, bytes)` files.
fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, auth: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::AUTHORIZATION, auth)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const LISTING_FIELDS: &[(&str, &str)] = &[
    ("title", "Sea View Flat"),
    ("description", "Two bedroom flat facing the sea"),
    ("price", "7500000"),
    ("propertyType", "APARTMENT"),
    ("listingType", "SALE"),
    ("address", "12 Marine Drive"),
    ("city", "Mumbai"),
    ("state", "Maharashtra"),
];

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_route_without_token_returns_401() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/properties/admin/all")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_admin_route_with_garbage_token_returns_401() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/analytics/dashboard")
                .method("GET")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inquiry_with_invalid_email_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(json_request(
            "POST",
            "/inquiries",
            &serde_json::json!({
                "name": "Asha",
                "email": "not-an-email",
                "phone": "9876543210",
                "message": "Is the flat still available?"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_inquiry_with_malformed_json_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/inquiries")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_rating_out_of_range_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(json_request(
            "POST",
            "/reviews",
            &serde_json::json!({
                "propertyId": "01hprop0000000000000000000",
                "reviewerName": "Meera",
                "reviewerEmail": "meera@example.com",
                "rating": 6,
                "comment": "Great place"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_property_without_main_image_returns_400() {
    let app = create_test_router(empty_db());
    let body = multipart_body(LISTING_FIELDS, &[]);

    let response = app
        .oneshot(multipart_request("/properties", &bearer(&stored_admin()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Main image is required");
}

#[tokio::test]
async fn test_create_property_with_too_many_images_returns_400() {
    let limits = UploadLimits {
        max_file_size: 1024,
        max_images: 1,
        max_videos: 1,
    };
    let app = create_test_router_with(empty_db(), limits);
    let body = multipart_body(
        LISTING_FIELDS,
        &[
            ("images[]", "a.jpg", "image/jpeg", b"first"),
            ("images[]", "b.jpg", "image/jpeg", b"second"),
        ],
    );

    let response = app
        .oneshot(multipart_request("/properties", &bearer(&stored_admin()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_property_with_oversized_file_returns_413() {
    let limits = UploadLimits {
        max_file_size: 8,
        max_images: 5,
        max_videos: 1,
    };
    let app = create_test_router_with(empty_db(), limits);
    let body = multipart_body(
        LISTING_FIELDS,
        &[("mainImage", "main.jpg", "image/jpeg", b"far more than eight bytes")],
    );

    let response = app
        .oneshot(multipart_request("/properties", &bearer(&stored_admin()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_login_with_unknown_email_returns_401() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<admin::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            &serde_json::json!({"email": "nobody@estate.example", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_sets_auth_cookies() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[stored_admin()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            &serde_json::json!({"email": "owner@estate.example", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("SameSite=Lax")));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["admin"]["email"], "owner@estate.example");
    assert!(body["data"]["admin"].get("password").is_none());
    assert!(body["data"]["accessToken"].as_str().is_some());
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let admin = stored_admin();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin.clone()]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/me")
                .method("GET")
                .header(header::AUTHORIZATION, bearer(&admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], admin.id.as_str());
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/logout")
                .method("POST")
                .header(header::COOKIE, "accessToken=abc; refreshToken=def")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter(|v| v.to_str().unwrap().contains("Max-Age=0"))
        .count();
    assert_eq!(cleared, 2);
}

#[tokio::test]
async fn test_no_active_sidebar_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<sidebar_content::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/sidebar/active")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
