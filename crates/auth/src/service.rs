use crate::credentials::CredentialVerifier;
use crate::error::{AuthError, Result};
use crate::session::{IssuedSession, SessionManager};
use sessionauth_database::{CredentialStore, SessionStore};
use sessionauth_models::UserProfile;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

// No Debug on the request structs: they carry plaintext passwords.

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6))]
    pub password: String,
}

/// Request provenance recorded on new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

pub struct AuthService {
    sessions: Arc<SessionManager>,
    credentials: CredentialVerifier,
}

impl AuthService {
    pub fn new(sessions: Arc<SessionManager>, credentials: CredentialVerifier) -> Self {
        Self { sessions, credentials }
    }

    /// Wire both halves against their stores.
    pub fn with_stores(
        credential_store: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
        config: crate::session::SessionConfig,
    ) -> Self {
        Self::new(
            Arc::new(SessionManager::new(session_store, config)),
            CredentialVerifier::new(credential_store),
        )
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Register a new user and sign them in.
    pub async fn signup(&self, request: SignupRequest, client: &ClientInfo) -> Result<IssuedSession> {
        request.validate()?;

        let user_id = match self
            .credentials
            .create_identity(&request.name, &request.email, &request.password)
            .await
        {
            Ok(id) => id,
            Err(AuthError::EmailConflict) => {
                tracing::info!(email = %request.email, "Signup rejected, email already registered");
                return Err(AuthError::EmailConflict);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(user_id = %user_id, email = %request.email, "Identity created");

        self.issue(user_id, client).await
    }

    pub async fn login(&self, request: LoginRequest, client: &ClientInfo) -> Result<IssuedSession> {
        request.validate()?;

        let Some(user_id) = self
            .credentials
            .verify_credentials(&request.email, &request.password)
            .await?
        else {
            tracing::warn!(email = %request.email, "Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        tracing::info!(user_id = %user_id, "User logged in");

        self.issue(user_id, client).await
    }

    /// Returns the clearing `Set-Cookie` value.
    pub async fn logout(&self, cookie_header: Option<&str>) -> Result<String> {
        self.sessions.destroy_session(cookie_header).await
    }

    pub async fn me(&self, cookie_header: Option<&str>) -> Result<Option<UserProfile>> {
        self.sessions.resolve_current_user(cookie_header).await
    }

    pub async fn require_user(&self, cookie_header: Option<&str>) -> Result<UserProfile> {
        self.sessions.require_user(cookie_header).await
    }

    async fn issue(&self, user_id: uuid::Uuid, client: &ClientInfo) -> Result<IssuedSession> {
        self.sessions
            .create_session(
                user_id,
                client.user_agent.as_deref(),
                client.ip_address.as_deref(),
            )
            .await
    }
}
