//! Callback the external workflow uses to report progress and credentials.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::db;
use crate::db::projects::ProgressUpdate;
use crate::error::AppError;
use crate::models::ProjectStatus;
use crate::provisioning::steps::ProvisionStep;
use crate::provisioning::webhook::AUTH_HEADER;
use crate::state::SharedState;

#[derive(Deserialize, Default)]
pub struct ProgressReport {
    pub status: Option<String>,
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

impl ProgressReport {
    fn into_update(self) -> Result<ProgressUpdate, AppError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ProjectStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;

        let step = match (&self.step, status) {
            (Some(step), _) if step.trim().is_empty() => {
                return Err(AppError::BadRequest("step must not be empty".to_string()));
            }
            (Some(step), _) => Some(step.trim().to_string()),
            (None, Some(ProjectStatus::Ready)) => Some(ProvisionStep::Ready.label().to_string()),
            (None, _) => None,
        };

        Ok(ProgressUpdate {
            status,
            step,
            service_uuid: self.service_uuid,
            studio_url: self.studio_url,
            admin_username: self.admin_username,
            admin_password: self.admin_password,
            postgres_password: self.postgres_password,
            jwt_secret: self.jwt_secret,
            anon_key: self.anon_key,
            service_key: self.service_key,
        })
    }
}

pub async fn report_progress(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(report): Json<ProgressReport>,
) -> Result<Json<serde_json::Value>, AppError> {
    verify_secret(&headers, state.config.provisioner.auth_secret.as_deref())?;

    let update = report.into_update()?;

    // A report can race a teardown; a vanished row is a 404, not a failure.
    let project = db::projects::apply_progress(&state.pool, id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if ProvisionStep::parse(&project.step).is_none() {
        tracing::debug!(project_id = %id, step = %project.step, "Unrecognised provisioning step");
    }
    tracing::info!(
        project_id = %id,
        status = %project.status,
        step = %project.step,
        "Provisioning progress recorded"
    );

    Ok(Json(serde_json::json!({ "success": true })))
}

fn verify_secret(headers: &HeaderMap, expected: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        tracing::error!("Provisioner callback received but PROVISIONER_AUTH_SECRET is not set");
        return Err(AppError::Unauthorized("Callback not configured".to_string()));
    };

    let provided = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid provisioner secret".to_string()))
    }
}
