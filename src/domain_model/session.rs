use chrono::{DateTime, Utc};

/// Fingerprint of one active refresh token. Only the SHA-256 hash of the raw
/// token is ever stored; a leaked store cannot mint sessions.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash,
            created_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of the atomic consume-and-replace step against a user document.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionRotation {
    /// The presented hash was found and swapped for the replacement in one write.
    Rotated,
    /// The presented hash is unknown to the user's set: already consumed or
    /// never issued. Callers treat this as reuse.
    NotFound,
    /// The presented hash was found but past its stored expiry. The stale
    /// record is removed as a side effect.
    Expired,
}
