//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::storage::StorageConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Admin authentication configuration.
    pub auth: AuthConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// SMTP configuration. Email is disabled when absent.
    #[serde(default)]
    pub email: Option<EmailSettings>,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site (used in email links).
    pub url: String,
    /// Deployment environment name (`development`, `production`, ...).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServerConfig {
    /// Whether the server runs in production mode.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT and cookie settings for the admin back-office.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing access tokens.
    pub access_token_secret: String,
    /// Secret for signing refresh tokens.
    pub refresh_token_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,
    /// Mark auth cookies `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

/// SMTP settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// SMTP host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use implicit TLS (port 465) instead of STARTTLS.
    #[serde(default)]
    pub smtp_secure: bool,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_site_name")]
    pub from_name: String,
    /// Address that receives admin notifications.
    pub admin_address: String,
    /// Site name used in templates.
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty means same-origin only.
    #[serde(default)]
    pub origins: Vec<String>,
}

/// Upload limits and image processing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of a single uploaded file in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: usize,
    /// Maximum number of gallery images per request.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// Maximum number of videos per request.
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,
    /// Images wider than this are downscaled.
    #[serde(default = "default_image_max_width")]
    pub image_max_width: u32,
    /// JPEG quality for recompressed images (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl UploadConfig {
    /// Maximum size of a single file in bytes.
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Upper bound for a whole multipart body.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_file_size_bytes() * (self.max_images + self.max_videos + 2)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_images: default_max_images(),
            max_videos: default_max_videos(),
            image_max_width: default_image_max_width(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

fn default_environment() -> String {
    "development".to_string()
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_access_ttl() -> i64 {
    15
}

const fn default_refresh_ttl() -> i64 {
    7
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_site_name() -> String {
    "Estate".to_string()
}

const fn default_max_file_size_mb() -> usize {
    50
}

const fn default_max_images() -> usize {
    20
}

const fn default_max_videos() -> usize {
    5
}

const fn default_image_max_width() -> u32 {
    1920
}

const fn default_jpeg_quality() -> u8 {
    80
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ESTATE_ENV`)
    /// 3. Environment variables with `ESTATE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ESTATE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ESTATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ESTATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_defaults() {
        let upload = UploadConfig::default();
        assert_eq!(upload.max_file_size_bytes(), 50 * 1024 * 1024);
        assert_eq!(upload.max_images, 20);
        assert_eq!(upload.jpeg_quality, 80);
        assert!(upload.max_body_bytes() > upload.max_file_size_bytes());
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let raw = r#"
            [server]
            url = "https://estate.example"

            [database]
            url = "postgres://localhost/estate"

            [auth]
            access_token_secret = "a"
            refresh_token_secret = "b"

            [cors]
            origins = ["https://estate.example"]
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(config::Config::try_deserialize)
            .unwrap();

        assert_eq!(config.server.port, 5000);
        assert!(!config.server.is_production());
        assert_eq!(config.auth.access_token_ttl_minutes, 15);
        assert!(config.email.is_none());
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
        assert_eq!(config.cors.origins, vec!["https://estate.example".to_string()]);
    }
}
