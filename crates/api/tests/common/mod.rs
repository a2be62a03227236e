#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use adforge_api::config::{ServerConfig, StoreBackend};
use adforge_api::router::build_app_router;
use adforge_api::state::AppState;
use adforge_db::MemoryVersionStore;

pub const AD: &str = "ad-1";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// The store handle is returned so tests can simulate outages.
pub fn build_test_app() -> (Router, Arc<MemoryVersionStore>) {
    let config = test_config();
    let store = Arc::new(MemoryVersionStore::new());
    let state = AppState {
        store: store.clone(),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn stream_uri(stream: &str, rest: &str) -> String {
    format!("/api/v1/ads/{AD}/streams/{stream}{rest}")
}

/// Two voice tracks, both generated.
pub fn ready_voices() -> Value {
    json!({
        "kind": "voices",
        "tracks": [
            {
                "text": "Meet the new Aurora headphones.",
                "voice": { "id": "v-rachel", "provider": "elevenlabs", "name": "Rachel" },
                "generated_url": "https://cdn.example/v0.mp3",
                "generated_duration": 4.0
            },
            {
                "text": "Order today.",
                "voice": { "id": "v-rachel", "provider": "elevenlabs" },
                "generated_url": "https://cdn.example/v1.mp3",
                "generated_duration": 2.0
            }
        ]
    })
}

/// Create, fill and finalize a draft through the API. Returns the version id.
pub async fn finalized_version(app: &Router, stream: &str, payload: Value) -> String {
    let response = post(app.clone(), &stream_uri(stream, "/draft")).await;
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    put_json(
        app.clone(),
        &stream_uri(stream, "/draft"),
        json!({ "payload": payload }),
    )
    .await;
    post(app.clone(), &stream_uri(stream, "/draft/finalize")).await;
    id
}
