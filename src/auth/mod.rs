//! Authentication building blocks: password hashing, token issuance,
//! request authentication middleware.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{extract_bearer_token, optional_auth_middleware, AuthContext};
pub use password::PasswordHasher;
pub use token::{AccessClaims, ParsedToken, TokenService};
