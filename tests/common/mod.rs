use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use iskolar_api::auth::{self, Claims};
use iskolar_api::config;
use iskolar_api::database::models::UserRole;

// In-process harness: drive the router directly, no socket.

/// Send one request through a fresh router. Returns the status and the
/// parsed JSON body (Null when the body is empty or not JSON).
pub async fn call(request: Request<Body>) -> Result<(StatusCode, Value)> {
    let app = iskolar_api::app();
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, body))
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, path, token, None)
}

pub fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::POST, path, token, Some(body))
}

pub fn put_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::PUT, path, token, Some(body))
}

pub fn request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request build"),
        None => builder.body(Body::empty()).expect("request build"),
    }
}

// Tokens, signed with the same secret the router validates against.

pub fn token_for(role: UserRole) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: format!("{}@test.iskolar.ph", role.as_str()),
        role,
        school_name: None,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
    };
    auth::generate_jwt(&claims, &config::config().security.jwt_secret).expect("sign test token")
}

pub fn admin_token() -> String {
    token_for(UserRole::Admin)
}

pub fn student_token() -> String {
    token_for(UserRole::Student)
}

pub fn sponsor_token() -> String {
    token_for(UserRole::Sponsor)
}

pub fn school_token() -> String {
    token_for(UserRole::School)
}

/// Correctly signed but issued far outside the refresh window.
pub fn stale_token() -> String {
    let issued = Utc::now() - chrono::Duration::days(60);
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: "stale@test.iskolar.ph".to_string(),
        role: UserRole::Student,
        school_name: None,
        iat: issued.timestamp(),
        exp: (issued + chrono::Duration::hours(1)).timestamp(),
    };
    auth::generate_jwt(&claims, &config::config().security.jwt_secret).expect("sign test token")
}

// Spawned-binary harness for the end-to-end smoke tests.

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_iskolar-api"));
        cmd.env("ISKOLAR_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL and
        // JWT_SECRET from .env (loaded by the server itself)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // The server answers /health even when the database is down
                if resp.status() == reqwest::StatusCode::OK
                    || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
