//! In-memory backend implementing both store traits.
//!
//! All tables live behind one `tokio::sync::RwLock`, so every operation,
//! including the two-row identity insert, is atomic. Data is lost when the
//! last clone is dropped.

use crate::error::{DatabaseError, Result};
use crate::store::{CredentialStore, SessionStore, SessionWithUser, StoredCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessionauth_models::{
    Account, NewSession, NewUser, Session, User, UserProfile, CREDENTIALS_PROVIDER,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Unique index: email -> user id.
    emails: HashMap<String, Uuid>,
    accounts: Vec<Account>,
    sessions: HashMap<String, Session>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        Ok(self.tables.read().await.emails.get(email).copied())
    }

    async fn create_identity(&self, new_user: &NewUser, password_hash: &str) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.emails.contains_key(&new_user.email) {
            return Err(DatabaseError::duplicate("User", "email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            image: None,
            created_at: now,
            updated_at: now,
        };
        let account = Account {
            id: Uuid::new_v4(),
            user_id: user.id,
            provider_id: CREDENTIALS_PROVIDER.to_string(),
            account_id: new_user.email.clone(),
            password_hash: Some(password_hash.to_string()),
            created_at: now,
        };

        tables.emails.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        tables.accounts.push(account);

        Ok(user)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>> {
        let tables = self.tables.read().await;

        let Some(user_id) = tables.emails.get(email).copied() else {
            return Ok(None);
        };

        let credentials = tables
            .accounts
            .iter()
            .find(|a| a.user_id == user_id && a.provider_id == CREDENTIALS_PROVIDER)
            .and_then(|a| a.password_hash.clone())
            .map(|password_hash| StoredCredentials {
                user_id,
                password_hash,
            });

        Ok(credentials)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&new_session.user_id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "session references unknown user {}",
                new_session.user_id
            )));
        }
        if tables.sessions.contains_key(&new_session.token) {
            return Err(DatabaseError::duplicate("Session", "token"));
        }

        let session = Session {
            id: new_session.token.clone(),
            token: new_session.token.clone(),
            user_id: new_session.user_id,
            expires_at: new_session.expires_at,
            user_agent: new_session.user_agent.clone(),
            ip_address: new_session.ip_address.clone(),
            created_at: Utc::now(),
        };
        tables.sessions.insert(session.token.clone(), session.clone());

        Ok(session)
    }

    async fn find_with_user(&self, token: &str) -> Result<Option<SessionWithUser>> {
        let tables = self.tables.read().await;

        let found = tables.sessions.get(token).and_then(|session| {
            tables.users.get(&session.user_id).map(|user| SessionWithUser {
                session: session.clone(),
                user: UserProfile::from(user.clone()),
            })
        });

        Ok(found)
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool> {
        Ok(self.tables.write().await.sessions.remove(token).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ann() -> NewUser {
        NewUser {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
        }
    }

    fn new_session(token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> NewSession {
        NewSession {
            token: token.to_string(),
            user_id,
            expires_at,
            user_agent: None,
            ip_address: Some("203.0.113.7".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_identity_writes_user_and_account() {
        let store = MemoryStore::new();
        let user = store.create_identity(&ann(), "hash").await.unwrap();

        assert_eq!(store.find_user_id_by_email("ann@x.com").await.unwrap(), Some(user.id));
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.account_count().await, 1);

        let creds = store.find_credentials("ann@x.com").await.unwrap().unwrap();
        assert_eq!(creds.user_id, user.id);
        assert_eq!(creds.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_no_rows() {
        let store = MemoryStore::new();
        store.create_identity(&ann(), "hash").await.unwrap();

        let err = store.create_identity(&ann(), "other").await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_email_has_no_credentials() {
        let store = MemoryStore::new();
        assert!(store.find_user_id_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_credentials("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store
            .create(&new_session("abc", Uuid::new_v4(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_session_token_collision_is_duplicate() {
        let store = MemoryStore::new();
        let user = store.create_identity(&ann(), "hash").await.unwrap();
        let expires = Utc::now() + Duration::days(7);

        store.create(&new_session("abc", user.id, expires)).await.unwrap();
        let err = store.create(&new_session("abc", user.id, expires)).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_find_delete_and_expire_sessions() {
        let store = MemoryStore::new();
        let user = store.create_identity(&ann(), "hash").await.unwrap();
        let now = Utc::now();

        store.create(&new_session("live", user.id, now + Duration::days(7))).await.unwrap();
        store.create(&new_session("stale", user.id, now - Duration::seconds(1))).await.unwrap();

        let found = store.find_with_user("live").await.unwrap().unwrap();
        assert_eq!(found.user.email, "ann@x.com");
        assert_eq!(found.session.id, "live");
        assert_eq!(found.session.ip_address.as_deref(), Some("203.0.113.7"));

        assert_eq!(store.delete_expired(now).await.unwrap(), 1);
        assert!(store.find_with_user("stale").await.unwrap().is_none());

        assert!(store.delete_by_token("live").await.unwrap());
        assert!(!store.delete_by_token("live").await.unwrap());
        assert_eq!(store.session_count().await, 0);
    }
}
