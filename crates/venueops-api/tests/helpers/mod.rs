#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use figment::providers::{Format, Toml};
use figment::Figment;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use venueops_api::config::Config;
use venueops_api::server::{router, AppState};
use venueops_core::db::establish_connection;
use venueops_core::repository::SqliteRepository;

pub const SECRET: &str = "integration-secret";

/// An in-process application backed by a temporary database
pub struct TestApp {
    router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("api.db");

        let config = Config::from_figment(Figment::from(Toml::string(&format!(
            "[jwt]\nsecret = \"{SECRET}\"\n"
        ))))
        .expect("Failed to build test config");

        let pool = establish_connection(&db_path.to_string_lossy())
            .await
            .expect("Failed to establish test database connection");
        let state = AppState::new(SqliteRepository::new(pool), &config)
            .expect("Failed to build application state");

        Self {
            router: router(state),
            _temp_dir: temp_dir,
        }
    }

    /// Sends one request and returns the status and decoded JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(&token())).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(&token())).await
    }
}

/// A valid token for [`SECRET`], expiring in one hour.
pub fn token() -> String {
    signed(&json!({
        "sub": "1",
        "exp": chrono::Utc::now().timestamp() + 3600,
    }), SECRET)
}

pub fn signed(claims: &Value, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

pub fn weekly_sync() -> Value {
    json!({
        "title": "Weekly Sync",
        "status": "pending",
        "tenant_id": 7,
        "space_id": 3,
        "due_date": "2024-01-01T00:00:00Z",
        "recurrence_rule": "FREQ=WEEKLY;BYDAY=MO",
        "recurrence_end_date": "2024-01-22T00:00:00Z",
        "created_by": 1
    })
}
