//! Session repository
//!
//! Sessions are keyed by the SHA-256 of the opaque refresh token, so a
//! database leak does not hand out usable tokens. Consumption is a single
//! DELETE ... RETURNING, atomic, which is what makes refresh tokens
//! single-use under concurrent replay: the loser observes zero rows.

use crate::{error::AppError, models::session::*};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

pub struct SessionRepository {
    db: PgPool,
}

impl SessionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Store a new session under the given refresh token.
    pub async fn create(
        &self,
        token: &str,
        data: &SessionData,
        ttl_secs: u64,
    ) -> Result<(), AppError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, email, role, user_agent, ip, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Self::hash_token(token))
        .bind(data.user_id)
        .bind(&data.email)
        .bind(&data.role)
        .bind(&data.user_agent)
        .bind(&data.ip)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Atomically consume a session. A missing row and an expired row
    /// both surface as `SessionNotFound`; the expired row is gone either
    /// way.
    pub async fn get_and_delete(&self, token: &str) -> Result<SessionData, AppError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "DELETE FROM sessions WHERE token_hash = $1 RETURNING *",
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::SessionNotFound)?;

        if record.expires_at < Utc::now() {
            return Err(AppError::SessionNotFound);
        }

        Ok(SessionData {
            user_id: record.user_id,
            email: record.email,
            role: record.role,
            user_agent: record.user_agent,
            ip: record.ip,
        })
    }

    /// Drop a session. Deleting a token with no session is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Reap sessions past their expiry. Run periodically from the
    /// background sweep.
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = SessionRepository::hash_token("some-token");
        let b = SessionRepository::hash_token("some-token");
        let c = SessionRepository::hash_token("other-token");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
