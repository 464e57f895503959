pub mod steps;
pub mod webhook;

use async_trait::async_trait;
use uuid::Uuid;

pub use webhook::WebhookWorkflow;

/// Operations the external automation workflow performs on our behalf.
#[async_trait]
pub trait ProvisioningWorkflow: Send + Sync {
    async fn create_project(&self, project_id: Uuid) -> Result<(), WorkflowError>;
    async fn delete_project(&self, project_id: Uuid) -> Result<(), WorkflowError>;
}

#[derive(Debug)]
pub enum WorkflowError {
    /// Webhook URL or shared secret is not configured.
    NotConfigured(&'static str),
    Timeout,
    Rejected { status: u16, body: String },
    Transport(String),
}

impl WorkflowError {
    /// Message safe to return to the browser.
    pub fn public_message(&self) -> String {
        match self {
            WorkflowError::NotConfigured(_) => "Server configuration error".to_string(),
            WorkflowError::Timeout => "Webhook request timeout".to_string(),
            WorkflowError::Rejected { status, .. } => format!("Workflow failed: {status}"),
            WorkflowError::Transport(_) => "Failed to reach provisioning workflow".to_string(),
        }
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::NotConfigured(what) => write!(f, "missing {what}"),
            WorkflowError::Timeout => write!(f, "webhook request timed out"),
            WorkflowError::Rejected { status, body } => {
                write!(f, "workflow responded {status}: {body}")
            }
            WorkflowError::Transport(msg) => write!(f, "webhook request failed: {msg}"),
        }
    }
}
