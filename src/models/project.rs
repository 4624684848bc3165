//! Project domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

/// Who may read a project they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Anyone, including listings
    All,
    /// Anyone holding the id; never exposed through listings
    Link,
    /// Owner only
    Nobody,
}

impl AccessType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(AccessType::All),
            "link" => Some(AccessType::Link),
            "nobody" => Some(AccessType::Nobody),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::All => "all",
            AccessType::Link => "link",
            AccessType::Nobody => "nobody",
        }
    }
}

impl From<AccessType> for String {
    fn from(access: AccessType) -> Self {
        access.as_str().to_string()
    }
}

/// A stored file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(rename = "type")]
    pub file_type: String,
    pub name: String,
    #[serde(rename = "origName")]
    pub orig_name: String,
    pub url: String,
}

/// Project row. Attachments live in a jsonb column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub files: Json<Vec<ProjectFile>>,
    pub access: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 2, max = 128))]
    pub name: String,
    #[validate(length(max = 4096))]
    #[serde(default)]
    pub description: String,
    /// Defaults to "all" when omitted
    pub access: Option<String>,
    pub published: Option<bool>,
}

/// Sparse project update: omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 2, max = 128))]
    pub name: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    pub files: Option<Vec<ProjectFile>>,
    pub access: Option<String>,
    pub published: Option<bool>,
}

/// Full project view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub files: Vec<ProjectFile>,
    pub access: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            description: p.description,
            files: p.files.0,
            access: p.access,
            published: p.published,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Minimal listing item for public views
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Listing item for the owner: includes visibility and publication state
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProjectListItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub access: String,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}
