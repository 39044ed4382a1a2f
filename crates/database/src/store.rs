//! Storage seams used by the auth layer.
//!
//! Both traits are object safe so the service can hold an
//! `Arc<dyn SessionStore>` / `Arc<dyn CredentialStore>` chosen at startup:
//! the Postgres repositories in production, [`crate::MemoryStore`] for
//! ephemeral deployments and tests.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessionauth_models::{NewSession, NewUser, Session, User, UserProfile};
use uuid::Uuid;

/// The credentials-provider secret stored for a user.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

/// A session row joined with the user it belongs to.
#[derive(Debug, Clone)]
pub struct SessionWithUser {
    pub session: Session,
    pub user: UserProfile,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Point lookup on the unique email index.
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>>;

    /// Insert the user and its `credentials` account atomically.
    ///
    /// Fails with `DuplicateEntry` if the email is already registered.
    async fn create_identity(&self, new_user: &NewUser, password_hash: &str) -> Result<User>;

    /// Fetch the credentials-account secret for the user owning `email`.
    async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session. A token collision is a `DuplicateEntry`.
    async fn create(&self, new_session: &NewSession) -> Result<Session>;

    /// Look a session up by token, joined with its user.
    async fn find_with_user(&self, token: &str) -> Result<Option<SessionWithUser>>;

    /// Delete by token. Returns whether a row was removed.
    async fn delete_by_token(&self, token: &str) -> Result<bool>;

    /// Delete every session with `expires_at <= now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
