//! Todo resource routes and the realtime event stream.

use crate::handlers::{events, todo};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn todo_routes(state: AppState) -> Router {
    Router::new()
        .route("/todo", get(todo::find).post(todo::create))
        .route(
            "/todo/:id",
            get(todo::get).patch(todo::patch).delete(todo::remove),
        )
        .route("/events", get(events::events))
        .with_state(state)
}
