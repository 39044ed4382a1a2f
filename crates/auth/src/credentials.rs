use crate::error::{AuthError, Result};
use crate::password::PasswordHasher;
use sessionauth_database::CredentialStore;
use sessionauth_models::NewUser;
use std::sync::Arc;
use uuid::Uuid;

/// Password identities: creation and verification against stored hashes.
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        Ok(self.store.find_user_id_by_email(email).await?)
    }

    /// Create a user together with its credentials account.
    ///
    /// Either both records exist afterwards or neither does. A taken email
    /// is reported as `EmailConflict`, including when a concurrent signup
    /// wins the race between the lookup and the insert.
    pub async fn create_identity(&self, name: &str, email: &str, password: &str) -> Result<Uuid> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailConflict);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || PasswordHasher::hash(&password)).await??;

        let new_user = NewUser {
            name: name.to_owned(),
            email: email.to_owned(),
        };

        match self.store.create_identity(&new_user, &password_hash).await {
            Ok(user) => Ok(user.id),
            Err(e) if e.is_duplicate() => Err(AuthError::EmailConflict),
            Err(e) => Err(e.into()),
        }
    }

    /// `Some(user_id)` only when `password` matches the stored hash for
    /// `email`. Unknown emails still pay for one hash verification.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<Uuid>> {
        let stored = self.store.find_credentials(email).await?;
        let password = password.to_owned();

        match stored {
            Some(credentials) => {
                let hash = credentials.password_hash;
                let matches =
                    tokio::task::spawn_blocking(move || PasswordHasher::verify(&password, &hash)).await??;
                Ok(matches.then_some(credentials.user_id))
            }
            None => {
                tokio::task::spawn_blocking(move || PasswordHasher::verify_dummy(&password)).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionauth_database::{DatabaseError, MemoryStore, Result as DbResult, StoredCredentials};
    use sessionauth_models::User;

    fn verifier() -> (CredentialVerifier, MemoryStore) {
        let store = MemoryStore::new();
        (CredentialVerifier::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let (verifier, store) = verifier();
        let user_id = verifier.create_identity("Ann", "ann@x.com", "abcdef").await.unwrap();

        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.account_count().await, 1);
        assert_eq!(verifier.find_user_by_email("ann@x.com").await.unwrap(), Some(user_id));
        assert_eq!(
            verifier.verify_credentials("ann@x.com", "abcdef").await.unwrap(),
            Some(user_id)
        );
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_the_password() {
        let (verifier, store) = verifier();
        verifier.create_identity("Ann", "ann@x.com", "abcdef").await.unwrap();

        let stored = store.find_credentials("ann@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "abcdef");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let (verifier, _store) = verifier();
        verifier.create_identity("Ann", "ann@x.com", "abcdef").await.unwrap();

        assert_eq!(verifier.verify_credentials("ann@x.com", "abcdeg").await.unwrap(), None);
        assert_eq!(verifier.verify_credentials("nobody@x.com", "abcdef").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let (verifier, store) = verifier();
        verifier.create_identity("Ann", "ann@x.com", "abcdef").await.unwrap();

        let err = verifier
            .create_identity("Other", "ann@x.com", "zzzzzz")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailConflict));
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.account_count().await, 1);
    }

    /// A store whose email lookup misses while the insert hits the unique
    /// constraint, as when another signup commits in between.
    struct LostRaceStore;

    #[async_trait::async_trait]
    impl CredentialStore for LostRaceStore {
        async fn find_user_id_by_email(&self, _email: &str) -> DbResult<Option<Uuid>> {
            Ok(None)
        }

        async fn create_identity(&self, _new_user: &NewUser, _password_hash: &str) -> DbResult<User> {
            Err(DatabaseError::duplicate("User", "email"))
        }

        async fn find_credentials(&self, _email: &str) -> DbResult<Option<StoredCredentials>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_lost_signup_race_is_a_conflict() {
        let verifier = CredentialVerifier::new(Arc::new(LostRaceStore));

        let err = verifier
            .create_identity("Ann", "ann@x.com", "abcdef")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailConflict));
    }
}
