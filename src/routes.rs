//! Route registration
//!
//! Three groups: public probes, the auth endpoints (sign-in behind the
//! rate limiter), and the API surface behind the optional-auth layer;
//! handlers that require identity extract `AuthContext` and reject with
//! 401 when it is absent.

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{auth, handlers, middleware::AppState};

/// Upload ceiling; everything else is far smaller.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    let sign_in_routes = Router::new()
        .route("/api/v1/auth/sign-in", post(handlers::auth::sign_in))
        .layer(from_fn_with_state(
            state.clone(),
            crate::middleware::sign_in_rate_limit_middleware,
        ));

    let auth_routes = Router::new()
        .route("/api/v1/auth/sign-up", post(handlers::auth::sign_up))
        .route("/api/v1/auth/sign-out", post(handlers::auth::sign_out))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh));

    let api_routes = Router::new()
        // Users
        .route("/api/v1/user/all", get(handlers::user::list_users))
        .route("/api/v1/user/verify", post(handlers::user::verify_user))
        .route("/api/v1/user/avatar", post(handlers::user::upload_avatar))
        .route(
            "/api/v1/user/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // Projects
        .route(
            "/api/v1/projects",
            get(handlers::project::list_projects).post(handlers::project::create_project),
        )
        .route("/api/v1/projects/self", get(handlers::project::list_self_projects))
        .route("/api/v1/projects/drafts", get(handlers::project::list_drafts))
        .route(
            "/api/v1/projects/{id}",
            get(handlers::project::get_project)
                .put(handlers::project::update_project)
                .delete(handlers::project::delete_project),
        )
        .route(
            "/api/v1/projects/{id}/files",
            post(handlers::project::upload_project_file),
        )
        .route(
            "/api/v1/projects/{id}/files/{name}",
            delete(handlers::project::remove_project_file),
        )
        .layer(from_fn_with_state(state.clone(), auth::optional_auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(sign_in_routes)
        .merge(auth_routes)
        .merge(api_routes)
        .layer(from_fn(crate::middleware::request_tracking_middleware))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
