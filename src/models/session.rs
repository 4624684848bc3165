//! Session models
//!
//! A session binds a refresh token to the user and the client context
//! (user-agent, IP) that obtained it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What a session remembers about its owner and origin.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub user_agent: String,
    pub ip: String,
}

/// Stored session row, keyed by the hash of the refresh token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub user_agent: String,
    pub ip: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
