use crate::application_port::AuthError;
use crate::domain_model::{RefreshTokenRecord, SessionRotation, User, UserId};

/// Storage seam for user documents and their refresh-token sets.
///
/// Every session mutation is a single write against one user document;
/// implementations must make each method atomic per document so concurrent
/// refresh attempts cannot interleave inside a rotation.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `UserExists` if the email is taken.
    async fn insert(&self, user: User) -> Result<(), AuthError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AuthError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Append a session record to the user's set.
    async fn add_session(&self, id: UserId, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Consume the record matching `old_hash` and install `replacement` in the
    /// same write. Reports what it found; on `Expired` the stale record is
    /// removed and the replacement is NOT installed.
    async fn rotate_session(
        &self,
        id: UserId,
        old_hash: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<SessionRotation, AuthError>;

    /// Remove the record matching `token_hash`, if present. Idempotent.
    async fn remove_session(&self, id: UserId, token_hash: &str) -> Result<(), AuthError>;

    /// Revoke every session for the user. Idempotent.
    async fn clear_sessions(&self, id: UserId) -> Result<(), AuthError>;
}
