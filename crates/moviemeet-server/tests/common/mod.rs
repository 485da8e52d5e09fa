//! Test doubles and router setup shared by the integration tests.
//!
//! `test_app` connects lazily, so tests built on it must stop at auth,
//! validation or the movie provider. Storage tests use `app_with_pool`
//! with the pool handed out by `#[sqlx::test]`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use moviemeet_server::{
    auth::create_access_token,
    catalog::{MovieCatalog, NewMovie},
    config::TmdbConfig,
    error::AppError,
    routes::{create_router, AppState},
    tmdb::{Gateway, MovieProvider, ProviderError},
    Config,
};
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::RwLock;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/moviemeet_test".to_string(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expires_in: 900,
        refresh_token_expires_in: 3600,
        port: 0,
        tmdb: TmdbConfig::default(),
    }
}

pub fn test_app(tmdb: Option<Gateway>) -> Router {
    let config = test_config();
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    create_router(AppState { db, config, tmdb })
}

pub fn app_with_pool(db: PgPool, tmdb: Option<Gateway>) -> Router {
    create_router(AppState {
        db,
        config: test_config(),
        tmdb,
    })
}

pub fn access_token(user_id: i64, username: &str) -> String {
    create_access_token(user_id, username, JWT_SECRET, 900)
        .expect("token")
        .token
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::POST, uri, token, Some(body))
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

/// POST with a raw, possibly malformed, JSON body.
pub fn post_raw(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// Registers `username` and returns its access token and id.
pub async fn register(app: &Router, username: &str) -> (String, i64) {
    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/v1/auth/register",
            None,
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "securepass123",
                "password2": "securepass123"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);

    let token = body["access_token"].as_str().expect("access token").to_string();
    let id = body["user"]["id"].as_i64().expect("user id");
    (token, id)
}

/// Movie provider answering from canned payloads.
#[derive(Default)]
pub struct FakeProvider {
    pub details: HashMap<i64, Value>,
    pub listing: Vec<Value>,
    pub fail: bool,
}

impl FakeProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_listing(listing: Vec<Value>) -> Self {
        Self {
            listing,
            ..Self::default()
        }
    }

    pub fn with_details(tmdb_id: i64, details: Value) -> Self {
        let mut provider = Self::default();
        provider.details.insert(tmdb_id, details);
        provider
    }

    fn page(&self, page: u32) -> Result<Value, ProviderError> {
        if self.fail {
            return Err(ProviderError::Status(503));
        }
        Ok(json!({
            "page": page,
            "results": self.listing,
            "total_results": self.listing.len(),
        }))
    }
}

#[async_trait]
impl MovieProvider for FakeProvider {
    async fn search(&self, _query: &str, page: u32) -> Result<Value, ProviderError> {
        self.page(page)
    }

    async fn popular(&self, page: u32) -> Result<Value, ProviderError> {
        self.page(page)
    }

    async fn details(&self, tmdb_id: i64) -> Result<Value, ProviderError> {
        if self.fail {
            return Err(ProviderError::Status(503));
        }
        self.details
            .get(&tmdb_id)
            .cloned()
            .ok_or(ProviderError::Status(404))
    }

    async fn recommendations(&self, _tmdb_id: i64, page: u32) -> Result<Value, ProviderError> {
        self.page(page)
    }

    async fn reviews(&self, _tmdb_id: i64, page: u32) -> Result<Value, ProviderError> {
        self.page(page)
    }
}

pub fn gateway(provider: FakeProvider) -> Gateway {
    Gateway::new(Arc::new(provider), "https://image.test/t/p")
}

/// Movie catalog kept in a HashMap, enforcing the `tmdb_id` uniqueness the
/// real table has.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    movies: Arc<RwLock<HashMap<i64, NewMovie>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.movies.read().await.len()
    }

    pub async fn get(&self, id: i64) -> Option<NewMovie> {
        self.movies.read().await.get(&id).cloned()
    }

    async fn next_id(&self) -> i64 {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        *next_id
    }
}

#[async_trait]
impl MovieCatalog for InMemoryCatalog {
    async fn movie_exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.movies.read().await.contains_key(&id))
    }

    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<i64>, AppError> {
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .find(|(_, stored)| stored.tmdb_id == Some(tmdb_id))
            .map(|(id, _)| *id))
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<i64, AppError> {
        let id = self.next_id().await;
        self.movies.write().await.insert(id, movie.clone());
        Ok(id)
    }

    async fn upsert_by_tmdb_id(&self, tmdb_id: i64, movie: &NewMovie) -> Result<i64, AppError> {
        let id = match self.find_by_tmdb_id(tmdb_id).await? {
            Some(id) => id,
            None => self.next_id().await,
        };
        self.movies.write().await.insert(id, movie.clone());
        Ok(id)
    }
}
