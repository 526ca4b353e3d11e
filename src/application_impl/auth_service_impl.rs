use crate::application_port::{
    AccessToken, AuthContext, AuthError, AuthService, AuthSession, AuthTokens, CredentialHasher,
    LoginInput, PublicUser, RefreshToken, RegisterInput, TokenCodec,
};
use crate::domain_model::{RefreshTokenRecord, Role, SessionRotation, User, UserId};
use crate::domain_port::UserStore;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
        }
    }
}

/// SHA-256 fingerprint of a raw refresh token. This is the only form the
/// store ever sees.
pub fn token_fingerprint(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Clock-skew allowance when validating `exp`, in seconds.
    pub leeway_secs: u64,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    role: Role,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

fn encode_access(
    uid: UserId,
    role: Role,
    cfg: &JwtConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.access_ttl;
    let claims = AccessClaims {
        sub: uid.0.to_string(),
        role,
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn encode_refresh(uid: UserId, cfg: &JwtConfig) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.refresh_ttl;
    let claims = RefreshClaims {
        sub: uid.0.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn validation(cfg: &JwtConfig, validate_exp: bool) -> Validation {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = validate_exp;
    v.leeway = cfg.leeway_secs;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    v
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let v = validation(cfg, true);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

fn decode_refresh(token: &str, cfg: &JwtConfig, validate_exp: bool) -> Result<RefreshClaims, AuthError> {
    let v = validation(cfg, validate_exp);
    let data = decode::<RefreshClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, AuthError> {
        sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
        role: Role,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_access(user, role, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_refresh(user, &self.cfg)?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<AuthContext, AuthError> {
        let claims = decode_access(&token.0, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(AuthContext {
            user_id,
            role: claims.role,
        })
    }

    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<UserId, AuthError> {
        let claims = decode_refresh(&token.0, &self.cfg, true)?;
        Self::parse_user_id(&claims.sub)
    }

    async fn decode_refresh_token_lenient(
        &self,
        token: &RefreshToken,
    ) -> Result<UserId, AuthError> {
        let claims = decode_refresh(&token.0, &self.cfg, false)?;
        Self::parse_user_id(&claims.sub)
    }
}

pub struct RealAuthService {
    user_store: Arc<dyn UserStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    admin_emails: Vec<String>,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            user_store,
            credential_hasher,
            token_codec,
            admin_emails,
            min_password_len: 6,
        }
    }

    fn validate_register(&self, input: &RegisterInput) -> Result<(), AuthError> {
        if input.name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name must not be empty".into()));
        }
        if !input.email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".into()));
        }
        if input.password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }
        Ok(())
    }

    /// Issue a fresh token pair and record the refresh fingerprint. The raw
    /// refresh token leaves this function exactly once and is never stored.
    async fn issue_session(&self, user: &User) -> Result<AuthSession, AuthError> {
        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(user.id, user.role)
            .await?;
        let (refresh_token, refresh_exp) = self.token_codec.issue_refresh_token(user.id).await?;

        let record = RefreshTokenRecord::new(token_fingerprint(&refresh_token.0), refresh_exp);
        self.user_store.add_session(user.id, record).await?;

        Ok(AuthSession {
            user: PublicUser::from(user),
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<AuthSession, AuthError> {
        self.validate_register(&request)?;

        let RegisterInput {
            name,
            email,
            password,
        } = request;

        let role = if self.admin_emails.iter().any(|e| e == &email) {
            Role::Admin
        } else {
            Role::User
        };

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = User {
            id: UserId(Uuid::new_v4()),
            name,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
            sessions: Vec::new(),
        };

        self.user_store.insert(user.clone()).await?;
        self.issue_session(&user).await
    }

    async fn login(&self, request: LoginInput) -> Result<AuthSession, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .user_store
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user).await
    }

    async fn verify_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        // Stateless: signature + expiry only. The role claim was embedded at
        // issuance and is not re-read from the store here.
        self.token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let user_id = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))
            .await
            .map_err(|_| AuthError::TokenInvalid)?;

        let user = self
            .user_store
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let presented_hash = token_fingerprint(refresh_token);

        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(user.id, user.role)
            .await?;
        let (new_refresh_token, refresh_exp) =
            self.token_codec.issue_refresh_token(user.id).await?;
        let replacement =
            RefreshTokenRecord::new(token_fingerprint(&new_refresh_token.0), refresh_exp);

        // Consume-and-replace is one atomic write against the user document.
        match self
            .user_store
            .rotate_session(user_id, &presented_hash, replacement)
            .await?
        {
            SessionRotation::Rotated => Ok(AuthSession {
                user: PublicUser::from(&user),
                tokens: AuthTokens {
                    access_token,
                    refresh_token: new_refresh_token,
                    access_token_expires_at: access_exp,
                    refresh_token_expires_at: refresh_exp,
                },
            }),
            SessionRotation::NotFound => {
                // A signed token we no longer recognize means it was already
                // consumed, or minted from a leaked store snapshot. Revoke the
                // whole family.
                warn!(%user_id, "refresh token reuse detected, revoking all sessions");
                self.user_store.clear_sessions(user_id).await?;
                Err(AuthError::TokenReuse)
            }
            SessionRotation::Expired => Err(AuthError::TokenInvalid),
        }
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token = RefreshToken(refresh_token.to_string());
        let Ok(user_id) = self.token_codec.decode_refresh_token_lenient(&token).await else {
            // Malformed or foreign token: nothing to invalidate.
            return Ok(());
        };
        self.user_store
            .remove_session(user_id, &token_fingerprint(refresh_token))
            .await
    }

    async fn current_user(&self, user_id: UserId) -> Result<PublicUser, AuthError> {
        let user = self
            .user_store
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(PublicUser::from(&user))
    }
}
