use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cognabase::config::{Config, ProvisionerConfig, RegistrationMode};

pub const WORKFLOW_SECRET: &str = "test-workflow-secret";

/// A running test server instance with a dedicated test database and a mock
/// provisioning workflow.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub workflow: MockServer,
}

/// Knobs for `spawn_app_with`.
pub struct TestOptions {
    pub registration: RegistrationMode,
    pub bypass_auth: bool,
    pub create_limit: u32,
    /// Leave `PROVISIONER_WEBHOOK_URL` unset.
    pub workflow_unconfigured: bool,
    pub workflow_timeout: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            registration: RegistrationMode::Open,
            bypass_auth: false,
            create_limit: 100,
            workflow_unconfigured: false,
            workflow_timeout: Duration::from_secs(2),
        }
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user and return their access token.
    pub async fn signup(&self, email: &str) -> String {
        let (body, status) = self.register(email, "password123", "Tester").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a project while the workflow accepts, return the project JSON.
    pub async fn create_project(&self, token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth("/api/v1/projects", token, &json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body
    }

    /// Report progress as the external workflow would.
    pub async fn report(&self, project_id: &str, secret: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/api/v1/provisioner/projects/{project_id}")))
            .header("X-Auth-Secret", secret)
            .json(body)
            .send()
            .await
            .expect("provisioner report failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// GET a page with a session cookie, return (html, status).
    pub async fn get_page(&self, path: &str, token: &str) -> (String, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .header("Cookie", format!("access_token={token}"))
            .send()
            .await
            .expect("page request failed");
        let status = resp.status();
        (resp.text().await.unwrap_or_default(), status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Accept every create and delete call on the mock workflow.
    pub async fn workflow_accepts(&self) {
        for op in ["/create-project", "/delete-project"] {
            Mock::given(method("POST"))
                .and(path(op))
                .and(header("X-Auth-Secret", WORKFLOW_SECRET))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
                .mount(&self.workflow)
                .await;
        }
    }

    /// Make one workflow operation answer only after `delay`.
    pub async fn workflow_stalls(&self, op: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(op))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&self.workflow)
            .await;
    }

    /// Make one workflow operation fail with the given status. Takes
    /// precedence over `workflow_accepts`.
    pub async fn workflow_fails(&self, op: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(op))
            .respond_with(ResponseTemplate::new(status).set_body_string("workflow exploded"))
            .with_priority(1)
            .mount(&self.workflow)
            .await;
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(TestOptions::default()).await
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app_with(options: TestOptions) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("cognabase_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_url = admin_url(&base_url);

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let workflow = MockServer::start().await;

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        registration: options.registration,
        max_body_size: 65_536,
        log_level: "warn".to_string(),
        bypass_auth: options.bypass_auth,
        provisioner: ProvisionerConfig {
            webhook_url: (!options.workflow_unconfigured).then(|| workflow.uri()),
            auth_secret: Some(WORKFLOW_SECRET.to_string()),
            timeout: options.workflow_timeout,
        },
        create_limit: options.create_limit,
        create_window_secs: 60,
        poll_interval_secs: 3,
    };

    if config.bypass_auth {
        use cognabase::auth::extractor::{DEV_USER_EMAIL, DEV_USER_ID, DEV_USER_NAME};
        cognabase::db::users::ensure_dev_user(&pool, DEV_USER_ID, DEV_USER_EMAIL, DEV_USER_NAME)
            .await
            .expect("Failed to seed dev user");
    }

    let app = cognabase::build_app(pool.clone(), config).expect("Failed to build app");

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        workflow,
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
