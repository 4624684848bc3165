//! Project service: CRUD, read projections, and the visibility gate

use crate::{
    error::AppError,
    models::project::*,
    repository::ProjectRepository,
    services::storage_service::StorageService,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct ProjectService {
    projects: ProjectRepository,
    storage: Arc<StorageService>,
}

impl ProjectService {
    pub fn new(db: PgPool, storage: Arc<StorageService>) -> Self {
        Self {
            projects: ProjectRepository::new(db),
            storage,
        }
    }

    /// Public listing for one user's portfolio. Link-only and owner-only
    /// projects never appear here.
    pub async fn list_public(&self, user_id: Uuid) -> Result<Vec<ProjectListItem>, AppError> {
        self.projects.list_public(user_id).await
    }

    pub async fn list_owned(&self, owner: Uuid) -> Result<Vec<OwnerProjectListItem>, AppError> {
        self.projects.list_owned(owner).await
    }

    pub async fn list_drafts(&self, owner: Uuid) -> Result<Vec<OwnerProjectListItem>, AppError> {
        self.projects.list_drafts(owner).await
    }

    pub async fn create(
        &self,
        owner: Uuid,
        req: &CreateProjectRequest,
    ) -> Result<ProjectResponse, AppError> {
        let access = match &req.access {
            Some(s) => AccessType::parse(s)
                .ok_or_else(|| AppError::validation("access must be one of: all, link, nobody"))?,
            None => AccessType::All,
        };

        let project = self
            .projects
            .create(owner, &req.name, &req.description, access, req.published.unwrap_or(false))
            .await?;

        tracing::info!(project_id = %project.id, user_id = %owner, "Project created");

        Ok(ProjectResponse::from(project))
    }

    /// Fetch one project. The owner always gets it; anyone else passes
    /// through the visibility gate.
    pub async fn get(
        &self,
        project_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<ProjectResponse, AppError> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        ensure_readable(&project, viewer)?;

        Ok(ProjectResponse::from(project))
    }

    /// Sparse update scoped to the owner.
    pub async fn update(
        &self,
        project_id: Uuid,
        owner: Uuid,
        req: &UpdateProjectRequest,
    ) -> Result<ProjectResponse, AppError> {
        if let Some(access) = &req.access {
            AccessType::parse(access)
                .ok_or_else(|| AppError::validation("access must be one of: all, link, nobody"))?;
        }

        let project = self
            .projects
            .update(project_id, owner, req)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        Ok(ProjectResponse::from(project))
    }

    /// Delete a project and clean up its stored attachments best-effort.
    pub async fn delete(&self, project_id: Uuid, owner: Uuid) -> Result<(), AppError> {
        let project = self
            .projects
            .delete(project_id, owner)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        let path = project_files_path(project_id);
        for file in project.files.0 {
            if let Err(e) = self.storage.remove(&path, &file.name).await {
                tracing::warn!(%project_id, file = %file.name, "Failed to remove attachment: {}", e);
            }
        }

        tracing::info!(%project_id, user_id = %owner, "Project deleted");
        Ok(())
    }

    /// Upload an attachment and append it to the project's file list.
    pub async fn add_file(
        &self,
        project_id: Uuid,
        owner: Uuid,
        bytes: &[u8],
        content_type: &str,
        orig_name: &str,
    ) -> Result<ProjectResponse, AppError> {
        // Ownership check up front so we don't upload orphans
        self.projects
            .find_owned(project_id, owner)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        let stem = orig_name.split('.').next().unwrap_or("file");
        let name = format!("{}_{}", stem, Utc::now().timestamp());

        let path = project_files_path(project_id);
        let stored = self.storage.upload(bytes, content_type, &path, &name).await?;

        let file = ProjectFile {
            file_type: file_type_for(content_type),
            name: stored.name,
            orig_name: orig_name.to_string(),
            url: stored.url,
        };

        let project = self
            .projects
            .add_file(project_id, owner, &file)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        Ok(ProjectResponse::from(project))
    }

    /// Detach a file and remove the stored object best-effort.
    pub async fn remove_file(
        &self,
        project_id: Uuid,
        owner: Uuid,
        file_name: &str,
    ) -> Result<ProjectResponse, AppError> {
        let project = self
            .projects
            .remove_file(project_id, owner, file_name)
            .await?
            .ok_or(AppError::ProjectNotFound)?;

        let path = project_files_path(project_id);
        if let Err(e) = self.storage.remove(&path, file_name).await {
            tracing::warn!(%project_id, file = %file_name, "Failed to remove attachment: {}", e);
        }

        Ok(ProjectResponse::from(project))
    }
}

fn project_files_path(project_id: Uuid) -> String {
    format!("projects/{}", project_id.simple())
}

fn file_type_for(content_type: &str) -> String {
    if content_type.starts_with("image/") {
        "image".to_string()
    } else {
        "file".to_string()
    }
}

/// The visibility gate. The owner always reads; for everyone else,
/// `nobody` is refused while `all` and `link` are readable by any caller
/// holding the id; link-only secrecy rests on ids never being listed.
fn ensure_readable(project: &Project, viewer: Option<Uuid>) -> Result<(), AppError> {
    if viewer == Some(project.user_id) {
        return Ok(());
    }

    match AccessType::parse(&project.access) {
        Some(AccessType::All) | Some(AccessType::Link) => Ok(()),
        _ => Err(AppError::AccessForbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn project_with_access(access: AccessType) -> Project {
        Project {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "demo".to_string(),
            description: String::new(),
            files: Json(vec![]),
            access: access.as_str().to_string(),
            published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_always_reads() {
        let project = project_with_access(AccessType::Nobody);
        assert!(ensure_readable(&project, Some(project.user_id)).is_ok());
    }

    #[test]
    fn test_nobody_blocks_other_viewers() {
        let project = project_with_access(AccessType::Nobody);

        assert!(matches!(
            ensure_readable(&project, Some(Uuid::new_v4())),
            Err(AppError::AccessForbidden)
        ));
        assert!(matches!(ensure_readable(&project, None), Err(AppError::AccessForbidden)));
    }

    #[test]
    fn test_all_and_link_readable_by_anyone() {
        for access in [AccessType::All, AccessType::Link] {
            let project = project_with_access(access);
            assert!(ensure_readable(&project, None).is_ok());
            assert!(ensure_readable(&project, Some(Uuid::new_v4())).is_ok());
        }
    }

    #[test]
    fn test_unknown_access_value_is_refused() {
        let mut project = project_with_access(AccessType::All);
        project.access = "everyone".to_string();

        assert!(matches!(ensure_readable(&project, None), Err(AppError::AccessForbidden)));
    }

    #[test]
    fn test_file_type_for_content_types() {
        assert_eq!(file_type_for("image/png"), "image");
        assert_eq!(file_type_for("application/pdf"), "file");
    }
}
