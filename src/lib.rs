pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod views;
pub mod provisioning;
pub mod validation;
pub mod listing;
pub mod rate_limit;
pub mod sweeper;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth_redirect::redirect_unauthorized;
use crate::provisioning::{ProvisioningWorkflow, WebhookWorkflow};
use crate::rate_limit::{CreateRateLimiter, LoginRateLimiter};
use crate::state::{AppState, SharedState};

/// Shared state wired to the webhook-backed provisioning workflow.
pub fn build_state(pool: PgPool, config: Config) -> Result<SharedState, String> {
    let workflow = WebhookWorkflow::new(&config.provisioner)?;

    if config.provisioner.webhook_url.is_none() {
        tracing::warn!("PROVISIONER_WEBHOOK_URL not set; create and delete requests will fail");
    }

    Ok(state_with_workflow(pool, config, Arc::new(workflow)))
}

pub fn state_with_workflow(
    pool: PgPool,
    config: Config,
    workflow: Arc<dyn ProvisioningWorkflow>,
) -> SharedState {
    let create_limiter = CreateRateLimiter::new(config.create_limit, config.create_window_secs);

    Arc::new(AppState {
        pool,
        config,
        workflow,
        create_limiter,
        login_limiter: LoginRateLimiter::new(),
    })
}

pub fn build_app(pool: PgPool, config: Config) -> Result<Router, String> {
    Ok(build_router(build_state(pool, config)?))
}

pub fn build_router(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::provisioner_routes())
        .merge(views::view_routes().layer(axum::middleware::from_fn(redirect_unauthorized)))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::{encode_token, Claims};
    use crate::config::{ProvisionerConfig, RegistrationMode};
    use crate::provisioning::WorkflowError;

    const SECRET: &str = "router-test-secret";

    struct NeverCalled;

    #[async_trait]
    impl ProvisioningWorkflow for NeverCalled {
        async fn create_project(&self, _id: Uuid) -> Result<(), WorkflowError> {
            panic!("workflow should not be reached")
        }

        async fn delete_project(&self, _id: Uuid) -> Result<(), WorkflowError> {
            panic!("workflow should not be reached")
        }
    }

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            jwt_secret: SECRET.to_string(),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost".to_string(),
            registration: RegistrationMode::Open,
            max_body_size: 1024,
            log_level: "warn".to_string(),
            bypass_auth: false,
            provisioner: ProvisionerConfig {
                webhook_url: None,
                auth_secret: None,
                timeout: Duration::from_secs(1),
            },
            create_limit: 5,
            create_window_secs: 60,
            poll_interval_secs: 3,
        }
    }

    /// Router over a pool that never connects; only paths that stop before
    /// the database are exercised here.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        build_router(state_with_workflow(pool, test_config(), Arc::new(NeverCalled)))
    }

    fn bearer() -> String {
        let token = encode_token(&Claims::new(Uuid::now_v7(), "Ada".to_string()), SECRET).unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn health_carries_security_headers() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn api_requires_session() {
        let resp = app()
            .oneshot(Request::get("/api/v1/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing authentication token");
    }

    #[tokio::test]
    async fn pages_redirect_to_login() {
        let resp = app()
            .oneshot(Request::get("/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(resp.status().is_redirection());
        assert_eq!(resp.headers()[header::LOCATION], "/auth/login?next=/projects");
    }

    #[tokio::test]
    async fn invalid_name_rejected_before_workflow() {
        let resp = app()
            .oneshot(
                Request::post("/api/v1/projects")
                    .header(header::AUTHORIZATION, bearer())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"My_Project"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Only lowercase letters, numbers, and hyphens");
    }

    #[tokio::test]
    async fn malformed_project_id_is_bad_request() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/projects/not-a-uuid")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provisioner_callback_needs_secret() {
        let uri = format!("/api/v1/provisioner/projects/{}", Uuid::now_v7());
        let resp = app()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-auth-secret", "guess")
                    .body(Body::from(r#"{"status":"ready"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let body = format!(r#"{{"name":"{}"}}"#, "a".repeat(4096));
        let resp = app()
            .oneshot(
                Request::post("/api/v1/projects")
                    .header(header::AUTHORIZATION, bearer())
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
