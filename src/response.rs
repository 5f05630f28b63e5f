//! Success response helpers. Records and pages are returned bare, without an envelope.

use axum::{http::StatusCode, Json};
use serde_json::Value;

pub fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(data))
}

pub fn created(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(data))
}
