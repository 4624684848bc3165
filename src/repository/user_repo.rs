//! User repository

use crate::{error::AppError, models::user::*};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a new account. A unique-index violation on email maps to
    /// `UserAlreadyExists`.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        verification_code: &str,
        verification_expires_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, verification_code, verification_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(verification_code)
        .bind(verification_expires_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY registered_at")
            .fetch_all(&self.db)
            .await?;

        Ok(users)
    }

    /// Sparse patch: only provided fields overwrite stored values.
    pub async fn update(&self, id: Uuid, req: &UpdateUserRequest) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.email)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    pub async fn set_avatar(&self, id: Uuid, avatar: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(id)
            .bind(avatar)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consume a verification code: one-shot, code must match, be
    /// unexpired, and still present. Zero rows touched means the code is
    /// invalid (including the already-verified, code-cleared case).
    pub async fn verify(&self, id: Uuid, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE, verification_code = NULL, verification_expires_at = NULL
            WHERE id = $1
                AND verification_code = $2
                AND verification_expires_at > NOW()
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamp the user's last visit (sign-in time).
    pub async fn touch_last_visit(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_visit_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// The unique index on email is the only unique constraint users can hit.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    let is_unique = e
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        AppError::UserAlreadyExists
    } else {
        AppError::Database(e)
    }
}
