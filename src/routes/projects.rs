use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::listing::{self, ProjectPage};
use crate::models::Project;
use crate::provisioning::steps::Progress;
use crate::state::SharedState;
use crate::validation::validate_project_name;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<usize>,
}

#[derive(Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub progress: Progress,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProjectPage>, AppError> {
    let projects = db::projects::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(listing::paginate(
        &projects,
        &query.q,
        query.page.unwrap_or(1),
    )))
}

/// Rate limit, validate, record the row, then hand off to the provisioning
/// workflow. Rejected attempts still count against the limit.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    if let Err(retry_after) = state.create_limiter.check(auth.user_id) {
        return Err(AppError::RateLimited(format!(
            "Too many projects requested. Try again in {retry_after} seconds."
        )));
    }

    let name = req.name.as_str();
    validate_project_name(name).map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Not atomic; the unique index catches a racing insert below.
    if db::projects::exists_by_name(&state.pool, auth.user_id, name).await? {
        return Err(duplicate_name());
    }

    let project = db::projects::create(&state.pool, auth.user_id, name)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => duplicate_name(),
            _ => AppError::Database(e),
        })?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "Project requested");

    if let Err(e) = state.workflow.create_project(project.id).await {
        if let Err(db_err) = db::projects::mark_failed(&state.pool, project.id).await {
            tracing::error!(project_id = %project.id, "Failed to mark project failed: {db_err}");
        }
        return Err(e.into());
    }

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, AppError> {
    let project = find_owned(&state, id, &auth).await?;
    let progress = Progress::compute(&project.step, project.created_at, Utc::now());
    Ok(Json(ProjectDetail { project, progress }))
}

/// The row is only removed once the workflow has accepted the teardown.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = find_owned(&state, id, &auth).await?;

    state.workflow.delete_project(project.id).await?;

    db::projects::delete(&state.pool, project.id, auth.user_id).await?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "Project deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn find_owned(state: &SharedState, id: Uuid, auth: &AuthUser) -> Result<Project, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

fn duplicate_name() -> AppError {
    AppError::Conflict("You already have a project with this name".to_string())
}
