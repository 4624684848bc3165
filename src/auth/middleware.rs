//! Request authentication middleware
//!
//! The auth layer attaches an `AuthContext` when a valid access token is
//! presented and passes the request through otherwise; handlers that
//! require identity extract `AuthContext`, which rejects with 401 when it
//! is absent.

use crate::{error::AppError, middleware::AppState};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

/// Identity attached to the request extensions after token verification.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

// `Option<AuthContext>` never rejects; handlers with optional viewers
// use it for mixed-visibility reads.
impl<S> OptionalFromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthContext>().cloned())
    }
}

/// Pull the bearer token out of the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .ok_or(AppError::InvalidToken)
}

/// Attach an `AuthContext` when a valid access token is presented; pass
/// the request through untouched otherwise.
pub async fn optional_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_bearer_token(req.headers()) {
        if let Ok(parsed) = state.auth_service.parse_token(&token) {
            req.extensions_mut().insert(AuthContext {
                user_id: parsed.user_id,
                email: parsed.email,
                role: parsed.role,
            });
        }
    }

    next.run(req).await
}
