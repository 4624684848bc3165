//! Data access layer
//!
//! Each repository owns a pool handle and exposes the narrow set of
//! operations its service needs. Cross-request coordination is delegated
//! to the store: single-statement updates for patches and a
//! DELETE ... RETURNING for session consumption.

pub mod project_repo;
pub mod session_repo;
pub mod user_repo;

pub use project_repo::ProjectRepository;
pub use session_repo::SessionRepository;
pub use user_repo::UserRepository;
