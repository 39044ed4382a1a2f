use crate::error::{DatabaseError, Result};
use crate::store::{SessionStore, SessionWithUser};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessionauth_models::{NewSession, Session, UserProfile};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub struct SessionRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct SessionUserRow {
    id: String,
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    user_image: Option<String>,
}

impl From<SessionUserRow> for SessionWithUser {
    fn from(row: SessionUserRow) -> Self {
        Self {
            user: UserProfile {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                image: row.user_image,
            },
            session: Session {
                id: row.id,
                token: row.token,
                user_id: row.user_id,
                expires_at: row.expires_at,
                user_agent: row.user_agent,
                ip_address: row.ip_address,
                created_at: row.created_at,
            },
        }
    }
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    /// Create a new session
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, token, user_id, expires_at, user_agent, ip_address)
            VALUES ($1, $1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new_session.token)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .bind(&new_session.user_agent)
        .bind(&new_session.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Session", "token"))?;

        Ok(session)
    }

    /// Find session by token, joined with its owner
    async fn find_with_user(&self, token: &str) -> Result<Option<SessionWithUser>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT s.id, s.token, s.user_id, s.expires_at, s.user_agent,
                   s.ip_address, s.created_at,
                   u.name AS user_name, u.email AS user_email, u.image AS user_image
            FROM sessions s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionWithUser::from))
    }

    /// Delete session by token (logout)
    async fn delete_by_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clean up expired sessions
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
