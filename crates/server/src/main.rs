//! Estate server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    routing::get,
};
use estate_api::{AppState, UploadLimits, auth_middleware, router as api_router};
use estate_common::config::CorsConfig;
use estate_common::{Config, LocalStorage, SharedStorage, StorageConfig};
use estate_core::{
    AnalyticsService, AuthService, EmailService, ExpertiseService, InquiryService, MediaConfig,
    MediaService, PropertyService, ReviewService, SidebarService, Uploader,
};
use estate_db::repositories::{
    AdminRepository, AnalyticsRepository, ExpertiseRepository, InquiryRepository,
    PropertyRepository, ReviewRepository, SidebarRepository,
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the configured storage backend.
fn build_storage(config: &StorageConfig) -> anyhow::Result<SharedStorage> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => {
            info!(path = %base_path.display(), "Using local file storage");
            Ok(Arc::new(LocalStorage::new(
                base_path.clone(),
                base_url.clone(),
            )))
        }
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            prefix,
        } => {
            info!(endpoint = %endpoint, bucket = %bucket, "Using S3 storage");
            Ok(Arc::new(estate_common::S3Storage::new(
                endpoint,
                bucket.clone(),
                region,
                access_key_id,
                secret_access_key,
                public_url.clone(),
                prefix.clone(),
            )))
        }
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => {
            anyhow::bail!("S3 storage is configured but the server was built without the `s3` feature")
        }
    }
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    if config.origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {o}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Credentialed requests carry the auth cookies.
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Liveness and database check.
async fn health(State(db): State<Arc<DatabaseConnection>>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"success": true, "status": "ok", "database": "up", "timestamp": timestamp})),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"success": false, "status": "degraded", "database": "down", "timestamp": timestamp})),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting estate server...");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    info!(environment = %config.server.environment, "Configuration loaded");
    estate_common::error::set_environment(&config.server.environment);

    // Connect to database
    let db = estate_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    estate_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let property_repo = PropertyRepository::new(Arc::clone(&db));
    let inquiry_repo = InquiryRepository::new(Arc::clone(&db));
    let expertise_repo = ExpertiseRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let sidebar_repo = SidebarRepository::new(Arc::clone(&db));
    let analytics_repo = AnalyticsRepository::new(Arc::clone(&db));
    let admin_repo = AdminRepository::new(Arc::clone(&db));

    // Storage, media and email
    let storage = build_storage(&config.storage)?;
    let media = MediaService::new(MediaConfig::from(&config.upload));
    let uploader = Uploader::new(storage, media);

    let email = EmailService::new(config.email.as_ref(), &config.server.url)?;
    if email.is_enabled() {
        info!("Email notifications enabled");
    } else {
        warn!("No email configuration, notifications are disabled");
    }

    // Initialize services
    let analytics_service = AnalyticsService::new(
        analytics_repo,
        property_repo.clone(),
        inquiry_repo.clone(),
        expertise_repo.clone(),
        review_repo.clone(),
    );
    let property_service = PropertyService::new(
        property_repo.clone(),
        uploader.clone(),
        analytics_service.clone(),
    );
    let inquiry_service = InquiryService::new(
        inquiry_repo,
        property_repo.clone(),
        analytics_service.clone(),
        email.clone(),
    );
    let expertise_service = ExpertiseService::new(expertise_repo, email.clone());
    let review_service = ReviewService::new(review_repo, property_repo, email);
    let sidebar_service = SidebarService::new(sidebar_repo, uploader);
    let auth_service = AuthService::new(admin_repo, &config.auth);

    let state = AppState {
        property_service,
        inquiry_service,
        expertise_service,
        review_service,
        sidebar_service,
        analytics_service,
        auth_service,
        upload_limits: UploadLimits::from(&config.upload),
        cookie_secure: config.auth.cookie_secure,
    };

    // Build router
    let mut app = Router::new()
        .route("/health", get(health).with_state(Arc::clone(&db)))
        .nest("/api", api_router());

    if let StorageConfig::Local {
        base_path,
        base_url,
    } = &config.storage
        && base_url.starts_with('/')
    {
        app = app.nest_service(base_url, ServeDir::new(base_path));
    }

    let app = app
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors)?)
        .with_state(state);

    // Start server with graceful shutdown
    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host: {}", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
