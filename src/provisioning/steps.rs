use chrono::{DateTime, Utc};
use serde::Serialize;

/// Named stages the external workflow reports while building an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStep {
    Validating,
    CreatingService,
    StartingService,
    Deploying,
    WaitingForHealth,
    Finalizing,
    Ready,
}

/// The stages shown on the progress timeline. `Ready` is terminal and not part
/// of it.
pub const TIMELINE: [ProvisionStep; 6] = [
    ProvisionStep::Validating,
    ProvisionStep::CreatingService,
    ProvisionStep::StartingService,
    ProvisionStep::Deploying,
    ProvisionStep::WaitingForHealth,
    ProvisionStep::Finalizing,
];

pub const FALLBACK_MESSAGE: &str = "Processing...";

impl ProvisionStep {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "validating" => Some(Self::Validating),
            "creating_service" => Some(Self::CreatingService),
            "starting_service" => Some(Self::StartingService),
            "deploying" => Some(Self::Deploying),
            "waiting_for_health" => Some(Self::WaitingForHealth),
            "finalizing" => Some(Self::Finalizing),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::CreatingService => "creating_service",
            Self::StartingService => "starting_service",
            Self::Deploying => "deploying",
            Self::WaitingForHealth => "waiting_for_health",
            Self::Finalizing => "finalizing",
            Self::Ready => "ready",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Validating => "Validating project configuration...",
            Self::CreatingService => "Creating infrastructure...",
            Self::StartingService => "Starting services...",
            Self::Deploying => "Deploying Supabase containers...",
            Self::WaitingForHealth => "Waiting for services to be ready...",
            Self::Finalizing => "Finalizing setup and extracting credentials...",
            Self::Ready => "Project is ready!",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Validating => "Configuration",
            Self::CreatingService => "Infrastructure",
            Self::StartingService => "Services",
            Self::Deploying => "Containers",
            Self::WaitingForHealth => "Health Check",
            Self::Finalizing => "Finalize",
            Self::Ready => "Ready",
        }
    }

    pub fn timeline_index(&self) -> Option<usize> {
        TIMELINE.iter().position(|s| s == self)
    }
}

/// Status line for a raw step label, falling back for labels the workflow
/// invents.
pub fn step_message(label: &str) -> &'static str {
    ProvisionStep::parse(label)
        .map(|s| s.message())
        .unwrap_or(FALLBACK_MESSAGE)
}

/// `creating_service` -> `creating service`
pub fn humanize_step(label: &str) -> String {
    label.replace('_', " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Complete,
    Active,
    Pending,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Complete => "complete",
            StageState::Active => "active",
            StageState::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    pub key: &'static str,
    pub title: &'static str,
    pub state: StageState,
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub current_index: Option<usize>,
    pub percent: u8,
    pub message: &'static str,
    pub elapsed_secs: i64,
    pub elapsed: String,
    pub stages: Vec<Stage>,
}

impl Progress {
    pub fn compute(step: &str, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let current_index = ProvisionStep::parse(step).and_then(|s| s.timeline_index());

        // Unknown or terminal steps count as index -1, i.e. 0%.
        let done = current_index.map(|i| i + 1).unwrap_or(0);
        let percent = ((done as f64 / TIMELINE.len() as f64) * 100.0).round() as u8;

        let elapsed_secs = (now - created_at).num_seconds().max(0);

        let stages = TIMELINE
            .iter()
            .enumerate()
            .map(|(i, s)| Stage {
                key: s.label(),
                title: s.title(),
                state: match current_index {
                    Some(c) if i < c => StageState::Complete,
                    Some(c) if i == c => StageState::Active,
                    _ => StageState::Pending,
                },
            })
            .collect();

        Progress {
            current_index,
            percent,
            message: step_message(step),
            elapsed_secs,
            elapsed: format_elapsed(elapsed_secs),
            stages,
        }
    }
}

/// Minutes and zero-padded seconds, e.g. `3:07`.
pub fn format_elapsed(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}
