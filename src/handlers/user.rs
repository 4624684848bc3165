//! User handlers

use crate::{
    auth::AuthContext,
    error::AppError,
    handlers::upload::read_file_field,
    middleware::AppState,
    models::auth::StatusResponse,
    models::user::{UpdateUserRequest, VerifyRequest},
};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// GET /user/all : public listing with the safe projection.
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list_all().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self(&auth, id)?;
    req.validate()?;

    let user = state.user_service.update(id, &req).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self(&auth, id)?;

    state.user_service.delete(id).await?;
    Ok(Json(StatusResponse::new("Deleted")))
}

/// POST /user/verify : consume the sign-up verification code.
pub async fn verify_user(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.user_service.verify(auth.user_id, &req.code).await?;
    Ok(Json(StatusResponse::new("Verified")))
}

/// POST /user/avatar : multipart avatar upload.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = read_file_field(multipart).await?;

    let user = state
        .user_service
        .set_avatar(auth.user_id, &file.bytes, &file.content_type)
        .await?;

    Ok(Json(user))
}

/// Profile mutations are allowed on the caller's own record only.
fn ensure_self(auth: &AuthContext, id: Uuid) -> Result<(), AppError> {
    if auth.user_id != id {
        return Err(AppError::AccessForbidden);
    }
    Ok(())
}
