#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use cinesearch::config::Config;
use cinesearch::state::SharedState;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub const TOKEN_SECRET: &str = "integration-test-secret";

pub fn test_config(tmdb_url: Option<&str>) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.token_secret = Some(TOKEN_SECRET.to_string());
    config.security.auth_rate_limit.max_requests = 1000;
    config.tmdb.enrichment_stagger_ms = 0;
    if let Some(url) = tmdb_url {
        config.tmdb.api_key = Some("test-key".to_string());
        config.tmdb.base_url = url.to_string();
    }
    config
}

pub async fn spawn_app(config: Config) -> (Router, Arc<SharedState>) {
    let shared = Arc::new(
        SharedState::new(config)
            .await
            .expect("Failed to create shared state"),
    );
    let state = cinesearch::api::create_app_state(shared.clone(), None);
    (cinesearch::api::router(state), shared)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
