use crate::error::{DatabaseError, Result};
use crate::store::{CredentialStore, StoredCredentials};
use async_trait::async_trait;
use sessionauth_models::{NewUser, User, CREDENTIALS_PROVIDER};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn create_identity(&self, new_user: &NewUser, password_hash: &str) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "User", "email"))?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, provider_id, account_id, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(CREDENTIALS_PROVIDER)
        .bind(&new_user.email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Account", "email"))?;

        // Dropping the transaction without commit rolls back the user row.
        tx.commit().await?;

        Ok(user)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT u.id, a.password_hash
            FROM users u
            INNER JOIN accounts a
                ON a.user_id = u.id AND a.provider_id = $2
            WHERE u.email = $1 AND a.password_hash IS NOT NULL
            "#,
        )
        .bind(email)
        .bind(CREDENTIALS_PROVIDER)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, password_hash)| StoredCredentials {
            user_id,
            password_hash,
        }))
    }
}
