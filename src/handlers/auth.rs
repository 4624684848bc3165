//! Auth handlers: sign-up, sign-in, sign-out, refresh
//!
//! The refresh token travels only in the http-only session cookie; the
//! access token only in response bodies.

use crate::{
    error::AppError,
    middleware::{client_ip, compose_user_agent, AppState},
    models::auth::{cookie_value, SignInRequest, StatusResponse, SESSION_COOKIE},
    models::user::SignUpRequest,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use std::sync::Arc;
use validator::Validate;

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.user_service.sign_up(&req).await?;

    Ok((StatusCode::CREATED, Json(StatusResponse::new("Created"))))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user_agent = compose_user_agent(&headers);
    let ip = client_ip(&headers, state.config.security.trust_proxy)
        .unwrap_or_else(|| "unknown".to_string());

    let (token, cookie) = state
        .auth_service
        .sign_in(&req.email, &req.password, &user_agent, &ip)
        .await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_set_cookie())]),
        Json(token),
    ))
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = session_cookie(&headers)
        .ok_or_else(|| AppError::validation("missing session cookie"))?;

    let cookie = state.auth_service.sign_out(&token).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_set_cookie())]),
        Json(StatusResponse::new("Sign out success")),
    ))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    // No cookie and a consumed token look the same to the caller
    let token = session_cookie(&headers).ok_or(AppError::SessionNotFound)?;

    let user_agent = compose_user_agent(&headers);
    let ip = client_ip(&headers, state.config.security.trust_proxy)
        .unwrap_or_else(|| "unknown".to_string());

    let (token_response, cookie) = state.auth_service.refresh(&token, &user_agent, &ip).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_set_cookie())]),
        Json(token_response),
    ))
}

/// The refresh token from the request's Cookie header, if present.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| cookie_value(header, SESSION_COOKIE))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
