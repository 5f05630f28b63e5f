//! Strict schema checks for create, patch and query payloads.

use crate::error::{FieldError, FieldIssue, ValidationError};
use crate::schema::todo::{field, writable_fields, FieldKind, TodoData, TodoPatch};
use serde_json::{Map, Value};

pub const DATA_SCHEMA: &str = "TodoData";
pub const PATCH_SCHEMA: &str = "TodoPatch";
pub const QUERY_SCHEMA: &str = "TodoQuery";

const SCALAR_OPERATORS: &[&str] = &["$ne", "$gt", "$gte", "$lt", "$lte"];
const LIST_OPERATORS: &[&str] = &["$in", "$nin"];

pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a create body. Every writable field is required.
    pub fn validate_data(body: &Value) -> Result<TodoData, ValidationError> {
        let map = check_body(DATA_SCHEMA, body, true)?;
        typed(DATA_SCHEMA, map)
    }

    /// Validate a patch body. Fields are optional but at least one must be present.
    pub fn validate_patch(body: &Value) -> Result<TodoPatch, ValidationError> {
        let map = check_body(PATCH_SCHEMA, body, false)?;
        if map.is_empty() {
            return Err(ValidationError::single(
                PATCH_SCHEMA,
                "body",
                FieldIssue::InvalidValue { detail: "must contain at least one field".into() },
            ));
        }
        typed(PATCH_SCHEMA, map)
    }

    /// Validate a query object and coerce its leaves to the declared field types.
    /// Query-string values arrive as text, so `"3"` becomes `3` for `id` and
    /// `"true"` becomes `true` for `isDone`.
    pub fn validate_query(query: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut errors = Vec::new();
        let mut out = Map::new();
        for (key, value) in query {
            match key.as_str() {
                "$limit" | "$skip" => match coerce_count(value) {
                    Some(n) => {
                        out.insert(key.clone(), Value::from(n));
                    }
                    None => errors.push(FieldError::new(
                        key.as_str(),
                        FieldIssue::InvalidValue { detail: "must be a non-negative integer".into() },
                    )),
                },
                "$sort" => {
                    if let Some(sort) = coerce_sort(value, &mut errors) {
                        out.insert(key.clone(), Value::Object(sort));
                    }
                }
                k if k.starts_with('$') => {
                    errors.push(FieldError::new(k, FieldIssue::UnknownOperator { operator: k.to_string() }));
                }
                k => match field(k) {
                    Some(spec) => {
                        if let Some(v) = coerce_condition(k, spec.kind, value, &mut errors) {
                            out.insert(key.clone(), v);
                        }
                    }
                    None => errors.push(FieldError::new(k, FieldIssue::UnknownField)),
                },
            }
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError::new(QUERY_SCHEMA, errors))
        }
    }
}

fn check_body(schema: &'static str, body: &Value, required: bool) -> Result<Map<String, Value>, ValidationError> {
    let Value::Object(map) = body else {
        return Err(ValidationError::single(
            schema,
            "body",
            FieldIssue::WrongType { expected: "an object" },
        ));
    };
    let mut errors = Vec::new();
    for key in map.keys() {
        if !writable_fields().any(|f| f.name == key) {
            errors.push(FieldError::new(key.as_str(), FieldIssue::UnknownField));
        }
    }
    for spec in writable_fields() {
        match map.get(spec.name) {
            None if required => errors.push(FieldError::new(spec.name, FieldIssue::Missing)),
            None => {}
            Some(v) if !matches_kind(spec.kind, v) => errors.push(FieldError::new(
                spec.name,
                FieldIssue::WrongType { expected: spec.kind.describe() },
            )),
            Some(_) => {}
        }
    }
    if errors.is_empty() {
        Ok(map.clone())
    } else {
        Err(ValidationError::new(schema, errors))
    }
}

fn typed<T: serde::de::DeserializeOwned>(schema: &'static str, map: Map<String, Value>) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(map)).map_err(|e| {
        ValidationError::single(schema, "body", FieldIssue::InvalidValue { detail: e.to_string() })
    })
}

fn matches_kind(kind: FieldKind, v: &Value) -> bool {
    match kind {
        FieldKind::Integer => v.is_i64(),
        FieldKind::String => v.is_string(),
        FieldKind::Boolean => v.is_boolean(),
    }
}

fn coerce_scalar(kind: FieldKind, v: &Value) -> Option<Value> {
    if matches_kind(kind, v) {
        return Some(v.clone());
    }
    let s = v.as_str()?;
    match kind {
        FieldKind::Integer => s.trim().parse::<i64>().ok().map(Value::from),
        FieldKind::Boolean => match s {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        FieldKind::String => None,
    }
}

/// Counts saturate at `i64::MAX`, the largest LIMIT/OFFSET the store accepts.
fn coerce_count(v: &Value) -> Option<u64> {
    let n = match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    Some(n.min(i64::MAX as u64))
}

fn coerce_sort(v: &Value, errors: &mut Vec<FieldError>) -> Option<Map<String, Value>> {
    let Value::Object(map) = v else {
        errors.push(FieldError::new("$sort", FieldIssue::WrongType { expected: "an object" }));
        return None;
    };
    let mut out = Map::new();
    let before = errors.len();
    for (name, dir) in map {
        if field(name).is_none() {
            errors.push(FieldError::new(format!("$sort.{}", name), FieldIssue::UnknownField));
            continue;
        }
        let parsed = match dir {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(d @ (1 | -1)) => {
                out.insert(name.clone(), Value::from(d));
            }
            _ => errors.push(FieldError::new(
                format!("$sort.{}", name),
                FieldIssue::InvalidValue { detail: "must be 1 or -1".into() },
            )),
        }
    }
    (errors.len() == before).then_some(out)
}

fn coerce_condition(name: &str, kind: FieldKind, v: &Value, errors: &mut Vec<FieldError>) -> Option<Value> {
    let Value::Object(ops) = v else {
        return match coerce_scalar(kind, v) {
            Some(c) => Some(c),
            None => {
                errors.push(FieldError::new(name, FieldIssue::WrongType { expected: kind.describe() }));
                None
            }
        };
    };
    let before = errors.len();
    let mut out = Map::new();
    for (op, operand) in ops {
        let path = format!("{}.{}", name, op);
        if SCALAR_OPERATORS.contains(&op.as_str()) {
            match coerce_scalar(kind, operand) {
                Some(c) => {
                    out.insert(op.clone(), c);
                }
                None => errors.push(FieldError::new(path, FieldIssue::WrongType { expected: kind.describe() })),
            }
        } else if LIST_OPERATORS.contains(&op.as_str()) {
            let items = list_items(operand);
            let mut coerced = Vec::with_capacity(items.len());
            for item in items {
                match coerce_scalar(kind, item) {
                    Some(c) => coerced.push(c),
                    None => {
                        errors.push(FieldError::new(path.clone(), FieldIssue::WrongType { expected: kind.describe() }));
                        break;
                    }
                }
            }
            out.insert(op.clone(), Value::Array(coerced));
        } else {
            errors.push(FieldError::new(path, FieldIssue::UnknownOperator { operator: op.clone() }));
        }
    }
    (errors.len() == before).then_some(Value::Object(out))
}

/// `$in` operands arrive as an array, an index-keyed object (`id[$in][0]=1`)
/// or a single scalar.
fn list_items(v: &Value) -> Vec<&Value> {
    match v {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let mut indexed: Vec<(usize, &Value)> = map
                .iter()
                .map(|(k, v)| (k.parse::<usize>().unwrap_or(usize::MAX), v))
                .collect();
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, v)| v).collect()
        }
        other => vec![other],
    }
}
