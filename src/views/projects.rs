use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::listing;
use crate::models::{Project, ProjectStatus};
use crate::provisioning::steps::{humanize_step, Progress, Stage};
use crate::routes::projects::ListQuery;
use crate::state::SharedState;
use crate::validation::{sanitize_input, NAME_MAX_LEN, NAME_MIN_LEN};
use crate::views::{render, short_date};

#[derive(Template)]
#[template(path = "projects/list.html")]
struct ProjectListTemplate {
    user_name: String,
    search: String,
    owned: usize,
    total: usize,
    page: usize,
    total_pages: usize,
    pages: Vec<usize>,
    cards: Vec<ProjectCard>,
}

struct ProjectCard {
    id: String,
    name: String,
    status: String,
    step: String,
    created: String,
}

#[derive(Template)]
#[template(path = "projects/create.html")]
struct CreateTemplate {
    user_name: String,
    name: String,
    min_len: usize,
    max_len: usize,
}

#[derive(Template)]
#[template(path = "projects/ready.html")]
struct ReadyTemplate {
    user_name: String,
    project_id: String,
    project_name: String,
    created: String,
    studio_url: Option<String>,
    groups: Vec<CredentialGroup>,
}

struct CredentialGroup {
    title: &'static str,
    accent: &'static str,
    fields: Vec<CredentialField>,
}

struct CredentialField {
    key: &'static str,
    label: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "projects/progress.html")]
struct ProgressTemplate {
    user_name: String,
    project_id: String,
    project_name: String,
    status: String,
    failed: bool,
    message: String,
    percent: u8,
    stages: Vec<Stage>,
    elapsed: String,
    started_at: String,
    poll_interval_secs: u64,
}

#[derive(Deserialize)]
pub struct CreateQuery {
    pub name: Option<String>,
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let projects = db::projects::list_by_owner(&state.pool, auth.user_id).await?;
    let page = listing::paginate(&projects, &query.q, query.page.unwrap_or(1));

    let cards = page
        .projects
        .iter()
        .map(|p| ProjectCard {
            id: p.id.to_string(),
            name: p.project_name.clone(),
            status: p.status.clone(),
            step: humanize_step(&p.step),
            created: short_date(&p.created_at),
        })
        .collect();

    render(&ProjectListTemplate {
        user_name: auth.name,
        search: query.q,
        owned: page.owned,
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
        pages: (1..=page.total_pages).collect(),
        cards,
    })
}

pub async fn create_page(
    auth: AuthUser,
    Query(query): Query<CreateQuery>,
) -> Result<impl IntoResponse, AppError> {
    render(&CreateTemplate {
        user_name: auth.name,
        name: query.name.as_deref().map(sanitize_input).unwrap_or_default(),
        min_len: NAME_MIN_LEN,
        max_len: NAME_MAX_LEN,
    })
}

/// Credentials once ready, otherwise the progress card. The progress page
/// reloads itself while the workflow is still running.
pub async fn detail_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    match project.lifecycle() {
        ProjectStatus::Ready => render(&ready_view(auth.name, project)),
        status => {
            let progress = Progress::compute(&project.step, project.created_at, Utc::now());
            render(&ProgressTemplate {
                user_name: auth.name,
                project_id: project.id.to_string(),
                project_name: project.project_name,
                status: status.to_string(),
                failed: status == ProjectStatus::Failed,
                message: progress.message.to_string(),
                percent: progress.percent,
                stages: progress.stages,
                elapsed: progress.elapsed,
                started_at: project.created_at.format("%H:%M:%S UTC").to_string(),
                poll_interval_secs: state.config.poll_interval_secs,
            })
        }
    }
}

fn ready_view(user_name: String, project: Project) -> ReadyTemplate {
    let field = |key: &'static str, label: &'static str, value: Option<String>| CredentialField {
        key,
        label,
        value: value.unwrap_or_default(),
    };

    let groups = vec![
        CredentialGroup {
            title: "Admin Credentials",
            accent: "purple",
            fields: vec![
                field("admin_username", "Admin Username", project.admin_username),
                field("admin_password", "Admin Password", project.admin_password),
            ],
        },
        CredentialGroup {
            title: "Database",
            accent: "blue",
            fields: vec![field(
                "postgres_password",
                "PostgreSQL Password",
                project.postgres_password,
            )],
        },
        CredentialGroup {
            title: "API Keys",
            accent: "cyan",
            fields: vec![
                field("anon_key", "Anon Key (Public)", project.anon_key),
                field("service_key", "Service Key (Secret)", project.service_key),
            ],
        },
        CredentialGroup {
            title: "JWT Secret",
            accent: "pink",
            fields: vec![field("jwt_secret", "JWT Secret", project.jwt_secret)],
        },
    ];

    ReadyTemplate {
        user_name,
        project_id: project.id.to_string(),
        project_name: project.project_name,
        created: short_date(&project.created_at),
        studio_url: project.studio_url,
        groups,
    }
}
