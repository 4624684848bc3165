//! Auth orchestrator: sign-in, sign-out, refresh-token rotation
//!
//! A session lineage moves unauthenticated -> active -> (rotated ->
//! active)* or -> revoked. Refresh tokens are single-use: consumption is
//! the session store's atomic get-and-delete, and every successful
//! refresh mints a fresh token pair and session.

use crate::{
    auth::{PasswordHasher, TokenService},
    config::AppConfig,
    error::AppError,
    models::{
        auth::{CookieDescriptor, TokenResponse},
        session::SessionData,
    },
    repository::{SessionRepository, UserRepository},
};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    tokens: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
    refresh_token_exp_secs: u64,
    cookie_domain: String,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        tokens: Arc<TokenService>,
        hasher: Arc<PasswordHasher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            sessions: SessionRepository::new(db),
            tokens,
            hasher,
            refresh_token_exp_secs: config.security.refresh_token_exp_secs,
            cookie_domain: config.server.domain.clone(),
        }
    }

    /// Verify credentials, mint a token pair, and open a session bound to
    /// the requesting client context. Unknown email and wrong password
    /// are indistinguishable to the caller.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        ip: &str,
    ) -> Result<(TokenResponse, CookieDescriptor), AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            tracing::debug!(%ip, "Sign-in with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access_token(user.id, &user.email, &user.role)?;
        let refresh_token = self.tokens.new_opaque_token()?;

        self.sessions
            .create(
                &refresh_token,
                &SessionData {
                    user_id: user.id,
                    email: user.email,
                    role: user.role,
                    user_agent: user_agent.to_string(),
                    ip: ip.to_string(),
                },
                self.refresh_token_exp_secs,
            )
            .await?;

        let _ = self.users.touch_last_visit(user.id).await;

        tracing::info!(user_id = %user.id, "User signed in");

        let cookie =
            CookieDescriptor::session(&refresh_token, self.refresh_token_exp_secs, &self.cookie_domain);

        Ok((TokenResponse { access_token }, cookie))
    }

    /// Revoke the session. The expiring cookie is returned whether or not
    /// a session row existed.
    pub async fn sign_out(&self, refresh_token: &str) -> Result<CookieDescriptor, AppError> {
        self.sessions.delete(refresh_token).await?;

        Ok(CookieDescriptor::expired(&self.cookie_domain))
    }

    /// Rotate tokens. The session is consumed atomically, so a replayed
    /// token (stolen or stale) observes `SessionNotFound`; a consumed
    /// session whose client context differs from the caller's is refused
    /// as `SessionMismatch`.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        user_agent: &str,
        ip: &str,
    ) -> Result<(TokenResponse, CookieDescriptor), AppError> {
        let data = self.sessions.get_and_delete(refresh_token).await?;

        if data.user_agent != user_agent || data.ip != ip {
            tracing::warn!(user_id = %data.user_id, "Refresh from a different client context");
            return Err(AppError::SessionMismatch);
        }

        let access_token = self.tokens.issue_access_token(data.user_id, &data.email, &data.role)?;
        let new_refresh_token = self.tokens.new_opaque_token()?;

        self.sessions
            .create(
                &new_refresh_token,
                &SessionData {
                    user_id: data.user_id,
                    email: data.email,
                    role: data.role,
                    user_agent: user_agent.to_string(),
                    ip: ip.to_string(),
                },
                self.refresh_token_exp_secs,
            )
            .await?;

        let cookie = CookieDescriptor::session(
            &new_refresh_token,
            self.refresh_token_exp_secs,
            &self.cookie_domain,
        );

        Ok((TokenResponse { access_token }, cookie))
    }

    /// Entry point for the authorization middleware.
    pub fn parse_token(&self, access_token: &str) -> Result<crate::auth::ParsedToken, AppError> {
        self.tokens.parse_access_token(access_token)
    }
}
