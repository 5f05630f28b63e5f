#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use todo_service::{app, AppConfig, AppState, Params};
use tower::ServiceExt;

/// A fresh in-memory store behind the full router.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = AppConfig::with_store("sqlite::memory:");
        let state = AppState::connect(&config).await.unwrap();
        let router = app(state.clone(), &config);
        TestApp { router, state }
    }

    pub async fn seed(&self, count: usize) {
        for i in 0..count {
            self.state
                .service
                .create(json!({ "task": format!("task {}", i), "isDone": i % 2 == 0 }), Params::internal())
                .await
                .unwrap();
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Body::from(body.unwrap_or_default().to_string()))
            .unwrap();
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }
}
