//! Project handlers

use crate::{
    auth::AuthContext,
    error::AppError,
    handlers::upload::read_file_field,
    middleware::AppState,
    models::auth::StatusResponse,
    models::project::{CreateProjectRequest, UpdateProjectRequest},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Whose portfolio to list
    pub user: Uuid,
}

/// GET /projects?user= : public listing of one user's published work.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let projects = state.project_service.list_public(query.user).await?;
    Ok(Json(projects))
}

/// GET /projects/self : everything the caller owns.
pub async fn list_self_projects(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let projects = state.project_service.list_owned(auth.user_id).await?;
    Ok(Json(projects))
}

/// GET /projects/drafts : the caller's unpublished projects.
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let projects = state.project_service.list_drafts(auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let project = state.project_service.create(auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects/{id} : the owner sees everything; other viewers pass
/// the visibility gate.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    viewer: Option<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .project_service
        .get(id, viewer.map(|v| v.user_id))
        .await?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let project = state.project_service.update(id, auth.user_id, &req).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.project_service.delete(id, auth.user_id).await?;
    Ok(Json(StatusResponse::new("Deleted")))
}

/// POST /projects/{id}/files : multipart attachment upload.
pub async fn upload_project_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = read_file_field(multipart).await?;

    let project = state
        .project_service
        .add_file(id, auth.user_id, &file.bytes, &file.content_type, &file.orig_name)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// DELETE /projects/{id}/files/{name}
pub async fn remove_project_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .project_service
        .remove_file(id, auth.user_id, &name)
        .await?;

    Ok(Json(project))
}
