//! Service layer
//!
//! Services compose repositories and the auth building blocks behind the
//! HTTP handlers. Dependencies are handed in explicitly at construction.

pub mod auth_service;
pub mod project_service;
pub mod storage_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use project_service::ProjectService;
pub use storage_service::{StorageService, StoredFile};
pub use user_service::UserService;
