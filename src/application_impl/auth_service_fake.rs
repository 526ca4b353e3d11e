use crate::application_port::{
    AccessToken, AuthContext, AuthError, AuthService, AuthSession, AuthTokens, LoginInput,
    PublicUser, RefreshToken, RegisterInput,
};
use crate::domain_model::{Role, UserId};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAuthService {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal fake implementation for router tests and local hacking: tokens are
// transparent strings carrying the email. Emails starting with "admin" get
// the admin role.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn register(&self, request: RegisterInput) -> Result<AuthSession, AuthError> {
        Ok(fake_session(&request.email))
    }

    async fn login(&self, request: LoginInput) -> Result<AuthSession, AuthError> {
        Ok(fake_session(&request.email))
    }

    async fn verify_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let Some(email) = token.strip_prefix("fake-access-token:") else {
            return Err(AuthError::TokenInvalid);
        };
        Ok(AuthContext {
            user_id: fake_id(email),
            role: fake_role(email),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let Some(email) = refresh_token.strip_prefix("fake-refresh-token:") else {
            return Err(AuthError::TokenInvalid);
        };
        Ok(fake_session(email))
    }

    async fn logout(&self, _refresh_token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn current_user(&self, user_id: UserId) -> Result<PublicUser, AuthError> {
        Ok(PublicUser {
            id: user_id,
            name: "Fake User".to_string(),
            email: "fake@example.com".to_string(),
            role: Role::User,
        })
    }
}

fn fake_id(email: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        email.as_bytes(),
    ))
}

fn fake_role(email: &str) -> Role {
    if email.starts_with("admin") {
        Role::Admin
    } else {
        Role::User
    }
}

fn fake_session(email: &str) -> AuthSession {
    let now = Utc::now();
    AuthSession {
        user: PublicUser {
            id: fake_id(email),
            name: "Fake User".to_string(),
            email: email.to_string(),
            role: fake_role(email),
        },
        tokens: AuthTokens {
            access_token: AccessToken(format!("fake-access-token:{}", email)),
            access_token_expires_at: now + Duration::minutes(15),
            refresh_token: RefreshToken(format!("fake-refresh-token:{}", email)),
            refresh_token_expires_at: now + Duration::days(30),
        },
    }
}
