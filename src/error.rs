//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Fatal configuration problems. Raised at startup, never per request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("store is not configured: set {0}")]
    MissingStore(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Why a single field failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FieldIssue {
    Missing,
    WrongType { expected: &'static str },
    UnknownField,
    UnknownOperator { operator: String },
    InvalidValue { detail: String },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing => f.write_str("is required"),
            FieldIssue::WrongType { expected } => write!(f, "must be {}", expected),
            FieldIssue::UnknownField => f.write_str("is not allowed"),
            FieldIssue::UnknownOperator { operator } => write!(f, "uses unknown operator {}", operator),
            FieldIssue::InvalidValue { detail } => f.write_str(detail),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    #[serde(flatten)]
    pub issue: FieldIssue,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, issue: FieldIssue) -> Self {
        let field = field.into();
        let message = format!("{} {}", field, issue);
        FieldError { field, issue, message }
    }
}

/// Schema check failure listing every offending field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub schema: &'static str,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(schema: &'static str, errors: Vec<FieldError>) -> Self {
        ValidationError { schema, errors }
    }

    pub fn single(schema: &'static str, field: impl Into<String>, issue: FieldIssue) -> Self {
        ValidationError {
            schema,
            errors: vec![FieldError::new(field, issue)],
        }
    }

    pub fn has_issue(&self, field: &str, issue: &FieldIssue) -> bool {
        self.errors.iter().any(|e| e.field == field && &e.issue == issue)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "validation failed for {}: {}", self.schema, messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("no record found for id '{0}'")]
    NotFound(i64),
    #[error("request timed out after {0} ms")]
    Timeout(u128),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation and not-found outcomes are part of normal operation.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidId(_) | AppError::NotFound(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidId(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Timeout(_) => "Timeout",
            AppError::Db(_) | AppError::Internal(_) => "GeneralError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidId(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured details attached to the error, if any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(v) => serde_json::to_value(&v.errors).ok(),
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    pub message: String,
    pub code: u16,
    #[serde(rename = "className")]
    pub class_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

fn class_name(name: &str) -> &'static str {
    match name {
        "BadRequest" => "bad-request",
        "NotFound" => "not-found",
        "Timeout" => "timeout",
        _ => "general-error",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let name = self.name();
        let message = match &self {
            AppError::Db(_) | AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            name,
            message,
            code: status.as_u16(),
            class_name: class_name(name),
            data: self.data(),
        };
        (status, Json(body)).into_response()
    }
}
