use crate::application_port::AuthError;
use crate::domain_model::{RefreshTokenRecord, SessionRotation, User, UserId};
use crate::domain_port::UserStore;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory user documents. Each `DashMap` entry is mutated under its shard
/// lock, which gives the per-document write atomicity the rotation step needs.
pub struct MemoryUserStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        MemoryUserStore {
            users: DashMap::new(),
            emails: DashMap::new(),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<(), AuthError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn add_session(&self, id: UserId, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        user.sessions.push(record);
        Ok(())
    }

    async fn rotate_session(
        &self,
        id: UserId,
        old_hash: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<SessionRotation, AuthError> {
        let mut user = self.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        let Some(idx) = user.sessions.iter().position(|s| s.token_hash == old_hash) else {
            return Ok(SessionRotation::NotFound);
        };
        if user.sessions[idx].is_expired(Utc::now()) {
            user.sessions.remove(idx);
            return Ok(SessionRotation::Expired);
        }
        user.sessions.remove(idx);
        user.sessions.push(replacement);
        Ok(SessionRotation::Rotated)
    }

    async fn remove_session(&self, id: UserId, token_hash: &str) -> Result<(), AuthError> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.sessions.retain(|s| s.token_hash != token_hash);
        }
        Ok(())
    }

    async fn clear_sessions(&self, id: UserId) -> Result<(), AuthError> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.sessions.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::Role;
    use chrono::Duration;

    fn test_user(email: &str) -> User {
        User {
            id: UserId(uuid::Uuid::new_v4()),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2$fake".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            sessions: Vec::new(),
        }
    }

    fn record(hash: &str, ttl_secs: i64) -> RefreshTokenRecord {
        RefreshTokenRecord::new(hash.to_string(), Utc::now() + Duration::seconds(ttl_secs))
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.insert(test_user("a@example.com")).await.unwrap();
        let err = store.insert(test_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
    }

    #[tokio::test]
    async fn rotate_swaps_matching_session() {
        let store = MemoryUserStore::new();
        let user = test_user("a@example.com");
        let id = user.id;
        store.insert(user).await.unwrap();
        store.add_session(id, record("h0", 60)).await.unwrap();

        let outcome = store
            .rotate_session(id, "h0", record("h1", 60))
            .await
            .unwrap();
        assert_eq!(outcome, SessionRotation::Rotated);

        let sessions = store.get_by_id(id).await.unwrap().unwrap().sessions;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].token_hash, "h1");
    }

    #[tokio::test]
    async fn rotate_unknown_hash_reports_not_found() {
        let store = MemoryUserStore::new();
        let user = test_user("a@example.com");
        let id = user.id;
        store.insert(user).await.unwrap();
        store.add_session(id, record("h0", 60)).await.unwrap();

        let outcome = store
            .rotate_session(id, "other", record("h1", 60))
            .await
            .unwrap();
        assert_eq!(outcome, SessionRotation::NotFound);
        // the original set is untouched
        let sessions = store.get_by_id(id).await.unwrap().unwrap().sessions;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].token_hash, "h0");
    }

    #[tokio::test]
    async fn rotate_expired_record_removes_it_without_replacement() {
        let store = MemoryUserStore::new();
        let user = test_user("a@example.com");
        let id = user.id;
        store.insert(user).await.unwrap();
        store.add_session(id, record("h0", -60)).await.unwrap();

        let outcome = store
            .rotate_session(id, "h0", record("h1", 60))
            .await
            .unwrap();
        assert_eq!(outcome, SessionRotation::Expired);
        let sessions = store.get_by_id(id).await.unwrap().unwrap().sessions;
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn remove_and_clear_are_idempotent() {
        let store = MemoryUserStore::new();
        let user = test_user("a@example.com");
        let id = user.id;
        store.insert(user).await.unwrap();
        store.add_session(id, record("h0", 60)).await.unwrap();

        store.remove_session(id, "h0").await.unwrap();
        store.remove_session(id, "h0").await.unwrap();
        store.clear_sessions(id).await.unwrap();
        store.clear_sessions(id).await.unwrap();
        // unknown users are a no-op too
        store
            .remove_session(UserId(uuid::Uuid::new_v4()), "h0")
            .await
            .unwrap();
    }
}
