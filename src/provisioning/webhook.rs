use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::{ProvisioningWorkflow, WorkflowError};
use crate::config::ProvisionerConfig;

pub const AUTH_HEADER: &str = "X-Auth-Secret";

/// Longest slice of a failed response body kept for logs, in bytes.
const MAX_LOGGED_BODY: usize = 1024;

/// Calls the automation webhook at `{webhook_url}/create-project` and
/// `{webhook_url}/delete-project`.
pub struct WebhookWorkflow {
    client: reqwest::Client,
    webhook_url: Option<String>,
    auth_secret: Option<String>,
}

impl WebhookWorkflow {
    pub fn new(config: &ProvisionerConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("Failed to build webhook client: {e}"))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            auth_secret: config.auth_secret.clone(),
        })
    }

    async fn trigger(&self, operation: &str, project_id: Uuid) -> Result<(), WorkflowError> {
        let base = self
            .webhook_url
            .as_deref()
            .ok_or(WorkflowError::NotConfigured("PROVISIONER_WEBHOOK_URL"))?;
        let secret = self
            .auth_secret
            .as_deref()
            .ok_or(WorkflowError::NotConfigured("PROVISIONER_AUTH_SECRET"))?;

        let url = format!("{base}/{operation}");
        tracing::info!(%project_id, operation, "Triggering provisioning workflow");

        let resp = self
            .client
            .post(&url)
            .header(AUTH_HEADER, secret)
            .json(&json!({ "projectId": project_id }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WorkflowError::Timeout
                } else {
                    WorkflowError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_default();
        truncate_at_boundary(&mut body, MAX_LOGGED_BODY);

        tracing::warn!(
            %project_id,
            operation,
            status = status.as_u16(),
            "Provisioning workflow rejected request: {body}"
        );

        Err(WorkflowError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Cut `text` to at most `max` bytes without splitting a character.
fn truncate_at_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[async_trait]
impl ProvisioningWorkflow for WebhookWorkflow {
    async fn create_project(&self, project_id: Uuid) -> Result<(), WorkflowError> {
        self.trigger("create-project", project_id).await
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<(), WorkflowError> {
        self.trigger("delete-project", project_id).await
    }
}
