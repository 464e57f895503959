use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_body_size: usize,
    pub log_level: String,
    pub bypass_auth: bool,
    pub provisioner: ProvisionerConfig,
    pub create_limit: u32,
    pub create_window_secs: u64,
    pub poll_interval_secs: u64,
}

/// Connection details for the external provisioning workflow.
///
/// URL and secret are optional at startup; a request that needs them while
/// they are missing fails with a configuration error instead.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub webhook_url: Option<String>,
    pub auth_secret: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the
    /// process-environment case.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host: IpAddr = or("COGNABASE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_HOST: {e}"))?;

        let port: u16 = or("COGNABASE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_PORT: {e}"))?;

        let base_url = or("COGNABASE_BASE_URL", &format!("http://{host}:{port}"));

        let registration = match or("COGNABASE_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        let max_body_size: usize = or("COGNABASE_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_MAX_BODY_SIZE: {e}"))?;

        let log_level = or("COGNABASE_LOG_LEVEL", "info");

        let bypass_auth = parse_bool(&or("COGNABASE_BYPASS_AUTH", "false"));

        let timeout_secs: u64 = or("PROVISIONER_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid PROVISIONER_TIMEOUT_SECS: {e}"))?;

        let provisioner = ProvisionerConfig {
            webhook_url: lookup("PROVISIONER_WEBHOOK_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            auth_secret: lookup("PROVISIONER_AUTH_SECRET").filter(|s| !s.is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let create_limit: u32 = or("COGNABASE_CREATE_LIMIT", "5")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_CREATE_LIMIT: {e}"))?;

        let create_window_secs: u64 = or("COGNABASE_CREATE_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_CREATE_WINDOW_SECS: {e}"))?;

        let poll_interval_secs: u64 = or("COGNABASE_POLL_INTERVAL_SECS", "3")
            .parse()
            .map_err(|e| format!("Invalid COGNABASE_POLL_INTERVAL_SECS: {e}"))?;
        if poll_interval_secs == 0 {
            return Err("Invalid COGNABASE_POLL_INTERVAL_SECS: must be at least 1".to_string());
        }

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            registration,
            max_body_size,
            log_level,
            bypass_auth,
            provisioner,
            create_limit,
            create_window_secs,
            poll_interval_secs,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
