use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A requested database-platform instance. Everything after `step` is
/// written by the provisioning workflow once the instance is up.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_name: String,
    pub service_uuid: Option<String>,
    pub status: String,
    pub step: String,
    pub studio_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub postgres_password: Option<String>,
    pub jwt_secret: Option<String>,
    pub anon_key: Option<String>,
    pub service_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Parsed lifecycle status. Rows with an unrecognised value are treated
    /// as still creating.
    pub fn lifecycle(&self) -> ProjectStatus {
        self.status.parse().unwrap_or(ProjectStatus::Creating)
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            project_name: self.project_name.clone(),
            status: self.status.clone(),
            step: self.step.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing projection without any credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub project_name: String,
    pub status: String,
    pub step: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Creating,
    Ready,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Creating => "creating",
            ProjectStatus::Ready => "ready",
            ProjectStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creating" => Ok(ProjectStatus::Creating),
            "ready" => Ok(ProjectStatus::Ready),
            "failed" => Ok(ProjectStatus::Failed),
            other => Err(format!("Unknown project status '{other}'")),
        }
    }
}
