#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::Algorithm;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use userbase::{
    app::build_app,
    auth::password::hash_password,
    config::{AppConfig, JwtConfig},
    db,
    state::AppState,
    users::repo_types::{User, UserChanges},
};

pub const TEST_PASSWORD: &str = "testtest";
pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    seq: AtomicUsize,
    _dir: Option<TempDir>,
}

/// A seeded user together with its plaintext password.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub clean_password: String,
}

fn test_config(database_url: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: database_url.into(),
        jwt: JwtConfig {
            secret: TEST_SECRET.into(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 30,
        },
    })
}

fn assemble(db: SqlitePool, config: Arc<AppConfig>, dir: Option<TempDir>) -> TestApp {
    let router = build_app(AppState::from_parts(db.clone(), config.clone()));
    TestApp {
        router,
        db,
        config,
        seq: AtomicUsize::new(0),
        _dir: dir,
    }
}

pub async fn spawn_app() -> TestApp {
    let db = db::connect_in_memory().await.expect("open in-memory db");
    db::migrate(&db).await.expect("migrate");
    assemble(db, test_config("sqlite::memory:"), None)
}

/// Same app over a file-backed pool with several connections, for tests
/// that need requests to hit the store concurrently.
pub async fn spawn_app_on_disk() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("userbase.db").display());
    let db = db::connect(&url).await.expect("open file db");
    db::migrate(&db).await.expect("migrate");
    assemble(db, test_config(&url), Some(dir))
}

impl TestApp {
    /// Insert `Test{n}` / `Test{n}@test.com` straight into the store.
    pub async fn seed_user(&self) -> TestUser {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        let username = format!("Test{n}");
        let email = format!("{username}@test.com");
        let hash = hash_password(TEST_PASSWORD).expect("hash");

        let mut conn = self.db.acquire().await.expect("acquire");
        let user = User::create(
            &mut conn,
            &UserChanges {
                username: &username,
                email: &email,
                password_hash: &hash,
            },
        )
        .await
        .expect("seed user");

        TestUser {
            id: user.id,
            username,
            email,
            clean_password: TEST_PASSWORD.into(),
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        dispatch(self.router.clone(), req).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, None, body)).await
    }

    pub async fn put_json(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::PUT, uri, Some(token), body))
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post_form(&self, uri: &str, form: &[(&str, &str)]) -> (StatusCode, Value) {
        let encoded = serde_urlencoded::to_string(form).expect("encode form");
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encoded))
            .unwrap();
        self.send(req).await
    }

    pub async fn token_for(&self, user: &TestUser) -> String {
        let (status, body) = self
            .post_form(
                "/auth/token",
                &[
                    ("username", user.email.as_str()),
                    ("password", user.clean_password.as_str()),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().expect("access_token").to_owned()
    }
}

/// Drive one request through a router; usable from spawned tasks.
pub async fn dispatch(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(req).await.expect("oneshot");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
