//! Todo data shapes. Field names and JSON types are declared once in [`TODO_FIELDS`];
//! the structs below and the validator both follow that table.

use serde::{Deserialize, Serialize};

/// JSON type of a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    String,
    Boolean,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::Integer => "an integer",
            FieldKind::String => "a string",
            FieldKind::Boolean => "a boolean",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// False for store-assigned fields that clients may filter on but never write.
    pub writable: bool,
}

pub const FIELD_ID: &str = "id";
pub const FIELD_TASK: &str = "task";
pub const FIELD_IS_DONE: &str = "isDone";

pub const TODO_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: FIELD_ID, kind: FieldKind::Integer, writable: false },
    FieldSpec { name: FIELD_TASK, kind: FieldKind::String, writable: true },
    FieldSpec { name: FIELD_IS_DONE, kind: FieldKind::Boolean, writable: true },
];

pub const TODO_TABLE: &str = "todo";

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    TODO_FIELDS.iter().find(|f| f.name == name)
}

pub fn writable_fields() -> impl Iterator<Item = &'static FieldSpec> {
    TODO_FIELDS.iter().filter(|f| f.writable)
}

/// A persisted todo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub is_done: bool,
}

/// Create payload: every writable field, nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoData {
    pub task: String,
    pub is_done: bool,
}

/// Patch payload: a non-empty subset of the writable fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.is_done.is_none()
    }
}
