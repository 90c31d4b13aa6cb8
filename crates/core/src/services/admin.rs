//! Admin accounts and token authentication.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use estate_common::config::AuthConfig;
use estate_common::{AppError, AppResult, IdGenerator};
use estate_db::entities::admin;
use estate_db::repositories::AdminRepository;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::not_blank;

/// Minimum admin password length.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Role claim carried by every admin token.
pub const ADMIN_ROLE: &str = "admin";

/// Which secret a token is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Admin ID.
    pub sub: String,
    pub email: String,
    pub role: String,
    pub token_type: TokenType,
    pub iat: usize,
    pub exp: usize,
}

/// Access and refresh tokens issued at login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub access_expires_in: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expires_in: i64,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub admin: admin::Model,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = "MIN_PASSWORD_LENGTH", max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = "MIN_PASSWORD_LENGTH", max = 128))]
    pub new_password: String,
}

/// Token signing settings.
#[derive(Clone)]
pub struct TokenSettings {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl From<&AuthConfig> for TokenSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes.max(1)),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days.max(1)),
        }
    }
}

impl TokenSettings {
    const fn secret(&self, token_type: TokenType) -> &String {
        match token_type {
            TokenType::Access => &self.access_secret,
            TokenType::Refresh => &self.refresh_secret,
        }
    }

    const fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token of the given type for an admin.
    pub fn sign(&self, admin: &admin::Model, token_type: TokenType) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin.id.clone(),
            email: admin.email.clone(),
            role: ADMIN_ROLE.to_string(),
            token_type,
            iat: timestamp(now.timestamp()),
            exp: timestamp((now + self.ttl(token_type)).timestamp()),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(token_type).as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Decode and check a token. Any failure is reported as 401.
    pub fn verify(&self, token: &str, token_type: TokenType) -> AppResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(token_type).as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, ?token_type, "Token rejected");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if data.claims.token_type != token_type || data.claims.role != ADMIN_ROLE {
            return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
        }
        Ok(data.claims)
    }
}

fn timestamp(secs: i64) -> usize {
    usize::try_from(secs).unwrap_or_default()
}

/// Service for admin accounts and authentication.
#[derive(Clone)]
pub struct AuthService {
    admin_repo: AdminRepository,
    tokens: TokenSettings,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub fn new(admin_repo: AdminRepository, config: &AuthConfig) -> Self {
        Self {
            admin_repo,
            tokens: TokenSettings::from(config),
            id_gen: IdGenerator::new(),
        }
    }

    fn issue_tokens(&self, admin: &admin::Model) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.sign(admin, TokenType::Access)?,
            refresh_token: self.tokens.sign(admin, TokenType::Refresh)?,
            access_expires_in: self.tokens.access_ttl.num_seconds(),
            refresh_expires_in: self.tokens.refresh_ttl.num_seconds(),
        })
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.tokens.verify(token, TokenType::Access)
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        self.tokens.verify(token, TokenType::Refresh)
    }

    /// Register an admin. Open while no admin exists; afterwards only an
    /// authenticated admin (`actor`) may add accounts.
    pub async fn register(
        &self,
        input: RegisterInput,
        actor: Option<&Claims>,
    ) -> AppResult<admin::Model> {
        input.validate()?;

        if actor.is_none() && self.admin_repo.count().await? > 0 {
            return Err(AppError::Unauthorized(
                "Only an authenticated admin can register new admins".to_string(),
            ));
        }

        let email = input.email.trim().to_lowercase();
        if self.admin_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An admin with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let model = admin::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            password: Set(hash_password(&input.password)?),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.admin_repo.create(model).await?;
        tracing::info!(
            admin_id = %created.id,
            registered_by = ?actor.map(|c| c.sub.as_str()),
            "Admin registered"
        );
        Ok(created)
    }

    /// Check credentials and issue tokens.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let admin = self
            .admin_repo
            .find_by_email(input.email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &admin.password)? {
            tracing::info!(admin_id = %admin.id, "Failed admin login");
            return Err(invalid());
        }

        if let Err(e) = self.admin_repo.touch_last_login(&admin.id).await {
            tracing::warn!(admin_id = %admin.id, error = %e, "Failed to record last login");
        }

        let tokens = self.issue_tokens(&admin)?;
        tracing::info!(admin_id = %admin.id, "Admin logged in");
        Ok(AuthSession { admin, tokens })
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.verify_refresh(refresh_token)?;
        let admin = self
            .admin_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(AppError::unauthorized)?;
        self.tokens.sign(&admin, TokenType::Access)
    }

    /// The admin behind a verified token.
    pub async fn me(&self, claims: &Claims) -> AppResult<admin::Model> {
        self.admin_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(AppError::unauthorized)
    }

    /// Change the password of the signed in admin.
    pub async fn change_password(&self, admin_id: &str, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;

        let admin = self.admin_repo.get_by_id(admin_id).await?;
        if !verify_password(&input.current_password, &admin.password)? {
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }

        self.admin_repo
            .update_password(admin_id, hash_password(&input.new_password)?)
            .await?;
        tracing::info!(admin_id = %admin_id, "Admin password changed");
        Ok(())
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
