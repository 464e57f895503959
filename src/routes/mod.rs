pub mod auth;
pub mod projects;
pub mod provisioner;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get).delete(projects::delete),
        )
}

/// Endpoints called by the external provisioning workflow, authenticated by
/// shared secret instead of a user session.
pub fn provisioner_routes() -> Router<SharedState> {
    Router::new().route(
        "/api/v1/provisioner/projects/{id}",
        post(provisioner::report_progress),
    )
}
