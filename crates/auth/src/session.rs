use crate::cookie::{extract_cookie, CookieConfig};
use crate::error::{AuthError, Result};
use crate::token::{generate_session_token, is_well_formed};
use chrono::{Duration, Utc};
use sessionauth_database::SessionStore;
use sessionauth_models::{NewSession, Session, UserProfile};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Longest session lifetime accepted from configuration.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Longest accepted sweep period (30 days).
pub const MAX_CLEANUP_INTERVAL_SECS: u64 = 30 * 24 * 60 * 60;

fn parse_ttl_days(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_TTL_DAYS).contains(days))
        .map(Duration::days)
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie: CookieConfig,
    pub ttl: Duration,
    /// Period of the expired-session sweep. `None` disables it.
    pub cleanup_interval: Option<std::time::Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::default(),
            ttl: Duration::days(7),
            cleanup_interval: Some(std::time::Duration::from_secs(3600)),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttl = match std::env::var("SESSION_TTL_DAYS") {
            Ok(value) => parse_ttl_days(&value).unwrap_or_else(|| {
                tracing::warn!(
                    "SESSION_TTL_DAYS={} is not a whole number of days in 1..={}, using {} days",
                    value,
                    MAX_TTL_DAYS,
                    defaults.ttl.num_days()
                );
                defaults.ttl
            }),
            Err(_) => defaults.ttl,
        };

        let cleanup_interval = match std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) if secs > MAX_CLEANUP_INTERVAL_SECS => {
                tracing::warn!(
                    "SESSION_CLEANUP_INTERVAL_SECS={} exceeds {}, capping",
                    secs,
                    MAX_CLEANUP_INTERVAL_SECS
                );
                Some(std::time::Duration::from_secs(MAX_CLEANUP_INTERVAL_SECS))
            }
            Some(secs) => Some(std::time::Duration::from_secs(secs)),
            None => defaults.cleanup_interval,
        };

        Self {
            cookie: CookieConfig::from_env(),
            ttl,
            cleanup_interval,
        }
    }
}

/// A freshly persisted session and the `Set-Cookie` value announcing it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub set_cookie: String,
}

/// Owns the session lifecycle (`absent -> active -> absent`) and its
/// cookie representation.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Persist a new session for `user_id` and build its cookie.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<IssuedSession> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.ttl)
            .ok_or_else(|| AuthError::Internal("session expiry out of range".to_string()))?;
        let new_session = NewSession {
            token: generate_session_token(),
            user_id,
            expires_at,
            user_agent: user_agent.map(str::to_owned),
            ip_address: ip_address.map(str::to_owned),
        };

        let session = self.store.create(&new_session).await?;
        let set_cookie = self
            .config
            .cookie
            .session_cookie(&session.token, session.expires_at, now);

        tracing::info!(user_id = %user_id, expires_at = %session.expires_at, "Session created");

        Ok(IssuedSession { session, set_cookie })
    }

    /// Resolve the user behind the request's session cookie.
    ///
    /// A missing cookie, an unknown token and an expired session all yield
    /// `Ok(None)`; only store failures are errors. Expired rows are deleted
    /// on sight.
    pub async fn resolve_current_user(&self, cookie_header: Option<&str>) -> Result<Option<UserProfile>> {
        let Some(token) = self.session_token(cookie_header) else {
            return Ok(None);
        };

        let Some(found) = self.store.find_with_user(token).await? else {
            tracing::debug!("No session for presented token");
            return Ok(None);
        };

        if found.session.is_expired_at(Utc::now()) {
            self.store.delete_by_token(token).await?;
            tracing::debug!(user_id = %found.user.id, "Expired session removed on lookup");
            return Ok(None);
        }

        Ok(Some(found.user))
    }

    /// Like [`resolve_current_user`](Self::resolve_current_user), but a
    /// missing session is `Unauthorized`.
    pub async fn require_user(&self, cookie_header: Option<&str>) -> Result<UserProfile> {
        self.resolve_current_user(cookie_header)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// Delete the presented session, if any, and return the clearing
    /// `Set-Cookie` value. Idempotent.
    pub async fn destroy_session(&self, cookie_header: Option<&str>) -> Result<String> {
        if let Some(token) = self.session_token(cookie_header) {
            if self.store.delete_by_token(token).await? {
                tracing::info!("Session destroyed");
            }
        }

        Ok(self.config.cookie.clear_cookie())
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        Ok(self.store.delete_expired(Utc::now()).await?)
    }

    /// Periodically purge expired sessions until the handle is aborted.
    pub fn spawn_expiry_sweep(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match manager.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Expired sessions purged"),
                    Err(e) => tracing::error!("Session sweep failed: {}", e),
                }
            }
        })
    }

    fn session_token<'a>(&self, cookie_header: Option<&'a str>) -> Option<&'a str> {
        cookie_header
            .and_then(|header| extract_cookie(header, &self.config.cookie.name))
            .filter(|token| is_well_formed(token))
    }
}
