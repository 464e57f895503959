pub mod auth;
pub mod projects;

use askama::Template;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Public pages
        .route("/", get(auth::landing_page))
        .route("/auth/login", get(auth::login_page))
        .route("/auth/signup", get(auth::signup_page))
        // Dashboard
        .route("/projects", get(projects::list_page))
        .route("/create", get(projects::create_page))
        .route("/project/{id}", get(projects::detail_page))
}

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Template render failed: {e}")))
}

/// `Mar 4, 2026`
pub(crate) fn short_date(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}
