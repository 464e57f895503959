use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::provisioning::ProvisioningWorkflow;
use crate::rate_limit::{CreateRateLimiter, LoginRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub workflow: Arc<dyn ProvisioningWorkflow>,
    pub create_limiter: CreateRateLimiter,
    pub login_limiter: LoginRateLimiter,
}
