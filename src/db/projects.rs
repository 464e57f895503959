use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Project, ProjectStatus};

/// Fields the provisioning workflow may write. `None` leaves the column as is.
#[derive(Debug, Default, Clone)]
pub struct ProgressUpdate {
    pub status: Option<ProjectStatus>,
    pub step: Option<String>,
    pub service_uuid: Option<String>,
    pub studio_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub postgres_password: Option<String>,
    pub jwt_secret: Option<String>,
    pub anon_key: Option<String>,
    pub service_key: Option<String>,
}

pub async fn list_by_owner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Pre-insert existence check for (owner, name).
pub async fn exists_by_name(
    pool: &PgPool,
    user_id: Uuid,
    project_name: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM projects WHERE user_id = $1 AND project_name = $2")
            .bind(user_id)
            .bind(project_name)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    project_name: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (id, user_id, project_name, status, step)
         VALUES ($1, $2, $3, 'creating', 'validating') RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(project_name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn apply_progress(
    pool: &PgPool,
    id: Uuid,
    update: &ProgressUpdate,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
            status = COALESCE($2, status),
            step = COALESCE($3, step),
            service_uuid = COALESCE($4, service_uuid),
            studio_url = COALESCE($5, studio_url),
            admin_username = COALESCE($6, admin_username),
            admin_password = COALESCE($7, admin_password),
            postgres_password = COALESCE($8, postgres_password),
            jwt_secret = COALESCE($9, jwt_secret),
            anon_key = COALESCE($10, anon_key),
            service_key = COALESCE($11, service_key),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.step.as_deref())
    .bind(update.service_uuid.as_deref())
    .bind(update.studio_url.as_deref())
    .bind(update.admin_username.as_deref())
    .bind(update.admin_password.as_deref())
    .bind(update.postgres_password.as_deref())
    .bind(update.jwt_secret.as_deref())
    .bind(update.anon_key.as_deref())
    .bind(update.service_key.as_deref())
    .fetch_optional(pool)
    .await
}

/// Flag a row whose create webhook could not be triggered.
pub async fn mark_failed(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE projects SET status = 'failed', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
