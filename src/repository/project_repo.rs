//! Project repository

use crate::{error::AppError, models::project::*};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

pub struct ProjectRepository {
    db: PgPool,
}

impl ProjectRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        description: &str,
        access: AccessType,
        published: bool,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (user_id, name, description, access, published)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(access.as_str())
        .bind(published)
        .fetch_one(&self.db)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }

    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>, AppError> {
        let project =
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(project)
    }

    /// Public listing: published projects visible to everyone. Link-only
    /// projects are deliberately absent; their ids are the only way in.
    pub async fn list_public(&self, user_id: Uuid) -> Result<Vec<ProjectListItem>, AppError> {
        let projects = sqlx::query_as::<_, ProjectListItem>(
            r#"
            SELECT id, name, description, updated_at
            FROM projects
            WHERE user_id = $1 AND published AND access = 'all'
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(projects)
    }

    pub async fn list_owned(&self, user_id: Uuid) -> Result<Vec<OwnerProjectListItem>, AppError> {
        let projects = sqlx::query_as::<_, OwnerProjectListItem>(
            r#"
            SELECT id, name, description, access, published, updated_at
            FROM projects
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(projects)
    }

    pub async fn list_drafts(&self, user_id: Uuid) -> Result<Vec<OwnerProjectListItem>, AppError> {
        let projects = sqlx::query_as::<_, OwnerProjectListItem>(
            r#"
            SELECT id, name, description, access, published, updated_at
            FROM projects
            WHERE user_id = $1 AND NOT published
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(projects)
    }

    /// Sparse patch scoped to the owner; only provided fields overwrite
    /// stored values.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: &UpdateProjectRequest,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                files = COALESCE($5, files),
                access = COALESCE($6, access),
                published = COALESCE($7, published),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.files.clone().map(Json))
        .bind(&req.access)
        .bind(req.published)
        .fetch_optional(&self.db)
        .await?;

        Ok(project)
    }

    /// Append one attachment to the jsonb array.
    pub async fn add_file(
        &self,
        id: Uuid,
        user_id: Uuid,
        file: &ProjectFile,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET files = files || $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Json(file.clone()))
        .fetch_optional(&self.db)
        .await?;

        Ok(project)
    }

    /// Remove an attachment by stored name.
    pub async fn remove_file(
        &self,
        id: Uuid,
        user_id: Uuid,
        file_name: &str,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                files = (
                    SELECT COALESCE(jsonb_agg(f), '[]'::jsonb)
                    FROM jsonb_array_elements(projects.files) AS f
                    WHERE f->>'name' <> $3
                ),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(file_name)
        .fetch_optional(&self.db)
        .await?;

        Ok(project)
    }

    /// Delete a project, returning the row so stored attachments can be
    /// cleaned up afterwards.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "DELETE FROM projects WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(project)
    }
}
