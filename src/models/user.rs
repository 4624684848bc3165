//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User account row. The verification sub-record is flattened into the
/// `verification_*` columns; the code is cleared once consumed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub avatar: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_visit_at: DateTime<Utc>,
    pub verification_code: Option<String>,
    pub verified: bool,
    pub verification_expires_at: Option<DateTime<Utc>>,
}

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 2, max = 64))]
    pub name: String,
    #[validate(email, length(max = 64))]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

/// Sparse profile update: omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 64))]
    pub name: Option<String>,
    #[validate(email, length(max = 64))]
    pub email: Option<String>,
}

/// Verification code submission
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1, max = 128))]
    pub code: String,
}

/// User response (no credential or verification material)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar: Option<String>,
    pub verified: bool,
    pub registered_at: DateTime<Utc>,
    pub last_visit_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            avatar: user.avatar,
            verified: user.verified,
            registered_at: user.registered_at,
            last_visit_at: user.last_visit_at,
        }
    }
}
