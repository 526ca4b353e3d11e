use crate::domain_model::{Role, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("refresh token reuse detected")]
    TokenReuse,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Claims established by a verified access token. Role is embedded at
/// issuance; it is not re-read from the store per request.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: UserId,
    pub role: Role,
}

/// The user shape exposed over the wire. Never carries the password hash
/// or the session set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Result of login, register, or a successful refresh: the identity plus a
/// freshly issued token pair.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: PublicUser,
    pub tokens: AuthTokens,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
        role: Role,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<AuthContext, AuthError>;
    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<UserId, AuthError>;
    /// Decode ignoring expiry. Used by logout, which must accept stale tokens.
    async fn decode_refresh_token_lenient(
        &self,
        token: &RefreshToken,
    ) -> Result<UserId, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<AuthSession, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<AuthSession, AuthError>;
    async fn verify_token(&self, token: &str) -> Result<AuthContext, AuthError>;
    /// Exchange a refresh token for a new pair, consuming it (single use).
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;
    /// Drop the session matching `refresh_token`, if any. Always succeeds.
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn current_user(&self, user_id: UserId) -> Result<PublicUser, AuthError>;
}
