//! User service: sign-up, verification, profile CRUD, avatar upload

use crate::{
    auth::{PasswordHasher, TokenService},
    config::AppConfig,
    error::AppError,
    models::user::*,
    repository::UserRepository,
    services::storage_service::StorageService,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Storage path avatars are uploaded under.
const AVATAR_PATH: &str = "avatars";

pub struct UserService {
    users: UserRepository,
    tokens: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
    storage: Arc<StorageService>,
    verification_code_ttl_secs: u64,
}

impl UserService {
    pub fn new(
        db: PgPool,
        tokens: Arc<TokenService>,
        hasher: Arc<PasswordHasher>,
        storage: Arc<StorageService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(db),
            tokens,
            hasher,
            storage,
            verification_code_ttl_secs: config.security.verification_code_ttl_secs,
        }
    }

    /// Create an account with a fresh one-time verification code.
    pub async fn sign_up(&self, req: &SignUpRequest) -> Result<UserResponse, AppError> {
        let password_hash = self.hasher.hash(&req.password)?;
        let verification_code = self.tokens.new_opaque_token()?;
        let verification_expires_at =
            Utc::now() + Duration::seconds(self.verification_code_ttl_secs as i64);

        let user = self
            .users
            .create(&req.name, &req.email, &password_hash, &verification_code, verification_expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(UserResponse::from(user))
    }

    /// Consume the verification code for this account.
    pub async fn verify(&self, user_id: Uuid, code: &str) -> Result<(), AppError> {
        if !self.users.verify(user_id, code).await? {
            return Err(AppError::VerificationCodeInvalid);
        }

        tracing::info!(%user_id, "User verified");
        Ok(())
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;

        Ok(UserResponse::from(user))
    }

    pub async fn list_all(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.list_all().await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Sparse profile update; only provided fields change.
    pub async fn update(&self, user_id: Uuid, req: &UpdateUserRequest) -> Result<UserResponse, AppError> {
        let user = self.users.update(user_id, req).await?.ok_or(AppError::UserNotFound)?;

        Ok(UserResponse::from(user))
    }

    /// Delete the account; the stored avatar is removed best-effort.
    pub async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;

        if !self.users.delete(user_id).await? {
            return Err(AppError::UserNotFound);
        }

        if let Some(avatar) = &user.avatar {
            if let Some(name) = avatar.rsplit('/').next() {
                if let Err(e) = self.storage.remove(AVATAR_PATH, name).await {
                    tracing::warn!(%user_id, "Failed to remove avatar object: {}", e);
                }
            }
        }

        tracing::info!(%user_id, "User deleted");
        Ok(())
    }

    /// Upload a new avatar and record its URL. The previous object is
    /// removed best-effort when the key changes.
    pub async fn set_avatar(
        &self,
        user_id: Uuid,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<UserResponse, AppError> {
        let user = self.users.find_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;

        let ext = extension_for(content_type)
            .ok_or_else(|| AppError::validation("unsupported avatar content type"))?;
        let name = format!("{}.{}", user_id.simple(), ext);

        let stored = self.storage.upload(bytes, content_type, AVATAR_PATH, &name).await?;

        self.users.set_avatar(user_id, &stored.url).await?;

        if let Some(old) = &user.avatar {
            if let Some(old_name) = old.rsplit('/').next() {
                if old_name != stored.name {
                    if let Err(e) = self.storage.remove(AVATAR_PATH, old_name).await {
                        tracing::warn!(%user_id, "Failed to remove previous avatar: {}", e);
                    }
                }
            }
        }

        self.get_by_id(user_id).await
    }
}

/// File extension for the accepted avatar content types.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
