pub mod cleanup;

pub use cleanup::{CleanupServiceHealth, SessionCleanupService, SessionStatsSnapshot};

use crate::{
    error::Result,
    types::{CompanyId, Role, UserId},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

/// Session row as persisted in the `sessions` table. The id itself is the opaque
/// bearer token (never a JWT, never carries `company_id` in plaintext) — see
/// `SessionManager::generate_session_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionData {
    pub session_id: String,
    pub user_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Revoked,
}

/// Identity and scope resolved from a validated session, attached to the request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub role: Role,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl: Duration::hours(24) }
    }
}

/// Postgres-backed session store. Same `create`/`validate`/`revoke` surface as the
/// teacher's Redis-backed `SessionManager`, retargeted at a durable `sessions` table
/// since a session is a first-class persisted entity here, not a volatile cache entry.
#[derive(Clone)]
pub struct SessionManager {
    pool: PgPool,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(pool: PgPool, config: SessionConfig) -> Self {
        Self { pool, config }
    }

    /// 256-bit random, URL-safe token. Never logged; the cookie is its only carrier.
    fn generate_session_id() -> String {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..43).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
    }

    pub async fn create_session(
        &self,
        user_id: UserId,
        company_id: CompanyId,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<SessionData> {
        let now = Utc::now();
        let session_id = Self::generate_session_id();

        let session = sqlx::query_as::<_, SessionData>(
            r#"
            INSERT INTO sessions (session_id, user_id, company_id, created_at, expires_at, ip_address, user_agent, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            RETURNING session_id, user_id, company_id, created_at, expires_at, ip_address, user_agent, status
            "#,
        )
        .bind(&session_id)
        .bind(user_id.0)
        .bind(company_id.0)
        .bind(now)
        .bind(now + self.config.ttl)
        .bind(&ip_address)
        .bind(&user_agent)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = %user_id, company_id = %company_id, "session created");
        Ok(session)
    }

    /// Returns `Some(SessionUser)` only if the session is active, unexpired, and its
    /// user and company are both active — see the row-predicate invariant in §3.
    pub async fn validate_session(&self, session_id: &str) -> Result<Option<SessionUser>> {
        let row = sqlx::query_as::<_, (uuid::Uuid, uuid::Uuid, Role, String, String)>(
            r#"
            SELECT s.user_id, s.company_id, u.role, u.permissions::text, u.status::text
            FROM sessions s
            JOIN users u ON u.user_id = s.user_id
            JOIN companies c ON c.company_id = s.company_id
            WHERE s.session_id = $1
              AND s.status = 'active'
              AND s.expires_at > now()
              AND u.status = 'active'
              AND c.status = 'active'
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((user_id, company_id, role, permissions_json, _user_status)) = row else {
            return Ok(None);
        };

        let permissions: Vec<String> = serde_json::from_str(&permissions_json).unwrap_or_default();

        Ok(Some(SessionUser {
            user_id: user_id.into(),
            company_id: company_id.into(),
            role,
            permissions,
        }))
    }

    pub async fn revoke_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET status = 'revoked' WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn revoke_user_sessions(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE sessions SET status = 'revoked' WHERE user_id = $1 AND status = 'active'")
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Hard-deletes sessions that expired or were revoked more than `grace` ago.
    pub async fn cleanup_expired(&self, grace: Duration) -> Result<u64> {
        let cutoff = Utc::now() - grace;
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1 OR (status = 'revoked' AND created_at < $1)")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_active(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE status = 'active' AND expires_at > now()")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
