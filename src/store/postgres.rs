/// Postgres-backed stores
///
/// Schema lives in `migrations/`. Uniqueness of `users.email` is enforced by
/// the database; refresh-token expiry is enforced on every read.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::{TokenStateStore, UserStore};
use crate::auth::REFRESH_TOKEN_TTL_SECS;
use crate::error::StoreError;
use crate::principal::{Principal, Role};

type UserRow = (String, String, String, String, DateTime<Utc>);

fn into_principal(row: UserRow) -> Result<Principal, StoreError> {
    let (id, email, password_hash, role, created_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|_| StoreError::Backend(format!("unknown role {} for user {}", role, id)))?;

    Ok(Principal {
        id,
        email,
        password_hash,
        role,
        created_at,
    })
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, principal: &Principal) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&principal.id)
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(principal.role.as_str())
        .bind(principal.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Principal, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        into_principal(row)
    }

    async fn find_by_id(&self, id: &str) -> Result<Principal, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        into_principal(row)
    }
}

#[derive(Clone)]
pub struct PgTokenStateStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgTokenStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

#[async_trait]
impl TokenStateStore for PgTokenStateStore {
    async fn store(&self, token_id: &str, principal_id: &str) -> Result<(), StoreError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_id, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token_id)
            DO UPDATE SET user_id = EXCLUDED.user_id, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(token_id)
        .bind(principal_id)
        .bind(now + self.ttl)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> bool {
        let live = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM refresh_tokens WHERE token_id = $1 AND expires_at > $2
            )
            "#,
        )
        .bind(token_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match live {
            Ok(live) => !live,
            Err(e) => {
                tracing::warn!(
                    token_id = %token_id,
                    error = %e,
                    "Revocation lookup failed, treating token as revoked"
                );
                true
            }
        }
    }

    async fn revoke(&self, token_id: &str) -> Result<bool, StoreError> {
        let live = sqlx::query_scalar::<_, bool>(
            "DELETE FROM refresh_tokens WHERE token_id = $1 RETURNING expires_at > $2",
        )
        .bind(token_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(live.unwrap_or(false))
    }

    async fn resolve_principal(&self, token_id: &str) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM refresh_tokens WHERE token_id = $1 AND expires_at > $2",
        )
        .bind(token_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
