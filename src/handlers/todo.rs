//! Todo handlers: find, get, create, patch, remove.
//!
//! Every call is tagged with the REST provider so external resolvers run.

use crate::error::AppError;
use crate::extractors::CallerId;
use crate::pipeline::Params;
use crate::query::parse_query_pairs;
use crate::response::{created, ok};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

type Pairs = Query<Vec<(String, String)>>;

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidId(id_str.to_string()))
}

fn params(pairs: Vec<(String, String)>, caller: CallerId) -> Params {
    Params::rest(parse_query_pairs(pairs), caller.0)
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// GET /todo
pub async fn find(
    State(state): State<AppState>,
    caller: CallerId,
    Query(pairs): Pairs,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let page = state.service.find(params(pairs, caller)).await?;
    Ok(ok(page))
}

/// GET /todo/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    caller: CallerId,
    Query(pairs): Pairs,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = parse_id(&id_str)?;
    let record = state.service.get(id, params(pairs, caller)).await?;
    Ok(ok(record))
}

/// POST /todo
pub async fn create(
    State(state): State<AppState>,
    caller: CallerId,
    Query(pairs): Pairs,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let data = body(payload)?;
    let record = state.service.create(data, params(pairs, caller)).await?;
    Ok(created(record))
}

/// PATCH /todo/:id
pub async fn patch(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    caller: CallerId,
    Query(pairs): Pairs,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = parse_id(&id_str)?;
    let data = body(payload)?;
    let record = state.service.patch(id, data, params(pairs, caller)).await?;
    Ok(ok(record))
}

/// DELETE /todo/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    caller: CallerId,
    Query(pairs): Pairs,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = parse_id(&id_str)?;
    let record = state.service.remove(id, params(pairs, caller)).await?;
    Ok(ok(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidId(s)) if s == "abc"));
        assert!(matches!(parse_id("1.5"), Err(AppError::InvalidId(_))));
    }

    #[test]
    fn caller_header_lands_in_params() {
        let p = params(vec![("$limit".into(), "2".into())], CallerId(Some("bob".into())));
        assert!(p.is_external());
        assert_eq!(p.caller.as_deref(), Some("bob"));
        assert_eq!(p.query["$limit"], "2");
    }
}
