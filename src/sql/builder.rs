//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for the todo table.
//! Identifiers come from the field declarations only; values are always bound.

use crate::query::{Condition, Filter, FilterQuery, SortDirection};
use crate::schema::{TodoData, TodoPatch, FIELD_ID, FIELD_IS_DONE, FIELD_TASK, TODO_FIELDS, TODO_TABLE};
use crate::sql::BindValue;

/// Quote identifier (safe: only from field declarations).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> &'static str {
        self.params.push(v);
        "?"
    }
}

fn column_list() -> String {
    TODO_FIELDS
        .iter()
        .map(|f| quoted(f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, filters: &[Filter]) -> String {
    let mut parts = Vec::new();
    for f in filters {
        let col = quoted(f.field);
        let compare = |q: &mut QueryBuf, op: &str, v: &serde_json::Value| {
            let ph = q.push_param(BindValue::from_json(v));
            format!("{} {} {}", col, op, ph)
        };
        let part = match &f.condition {
            Condition::Eq(v) => compare(q, "=", v),
            Condition::Ne(v) => compare(q, "<>", v),
            Condition::Gt(v) => compare(q, ">", v),
            Condition::Gte(v) => compare(q, ">=", v),
            Condition::Lt(v) => compare(q, "<", v),
            Condition::Lte(v) => compare(q, "<=", v),
            Condition::In(vs) if vs.is_empty() => "1 = 0".to_string(),
            Condition::Nin(vs) if vs.is_empty() => continue,
            Condition::In(vs) | Condition::Nin(vs) => {
                let phs: Vec<&str> = vs.iter().map(|v| q.push_param(BindValue::from_json(v))).collect();
                let op = if matches!(f.condition, Condition::In(_)) { "IN" } else { "NOT IN" };
                format!("{} {} ({})", col, op, phs.join(", "))
            }
        };
        parts.push(part);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// ORDER BY the requested fields, then `id` so pages are stable.
fn order_clause(sort: &[(&'static str, SortDirection)]) -> String {
    let mut parts: Vec<String> = sort
        .iter()
        .map(|(name, dir)| {
            let dir = match dir {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("{} {}", quoted(name), dir)
        })
        .collect();
    if !sort.iter().any(|(name, _)| *name == FIELD_ID) {
        parts.push(format!("{} ASC", quoted(FIELD_ID)));
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT one page: filters, sort, LIMIT/OFFSET.
pub fn select_page(query: &FilterQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, &query.filters);
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        column_list(),
        quoted(TODO_TABLE),
        where_clause,
        order_clause(&query.sort),
        query.limit,
        query.skip
    );
    q
}

/// SELECT COUNT(*) over the same filters as [`select_page`].
pub fn count(query: &FilterQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, &query.filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(TODO_TABLE), where_clause);
    q
}

pub fn select_by_id(id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        column_list(),
        quoted(TODO_TABLE),
        quoted(FIELD_ID),
        ph
    );
    q
}

/// INSERT the writable fields; the store assigns `id`.
pub fn insert(data: &TodoData) -> QueryBuf {
    let mut q = QueryBuf::new();
    let task = q.push_param(BindValue::Text(data.task.clone()));
    let is_done = q.push_param(BindValue::Bool(data.is_done));
    q.sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ({}, {}) RETURNING {}",
        quoted(TODO_TABLE),
        quoted(FIELD_TASK),
        quoted(FIELD_IS_DONE),
        task,
        is_done,
        column_list()
    );
    q
}

/// UPDATE by id: SET only the fields present in the patch.
pub fn update(id: i64, patch: &TodoPatch) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    if let Some(task) = &patch.task {
        let ph = q.push_param(BindValue::Text(task.clone()));
        sets.push(format!("{} = {}", quoted(FIELD_TASK), ph));
    }
    if let Some(is_done) = patch.is_done {
        let ph = q.push_param(BindValue::Bool(is_done));
        sets.push(format!("{} = {}", quoted(FIELD_IS_DONE), ph));
    }
    if sets.is_empty() {
        return select_by_id(id);
    }
    let ph = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(TODO_TABLE),
        sets.join(", "),
        quoted(FIELD_ID),
        ph,
        column_list()
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(TODO_TABLE),
        quoted(FIELD_ID),
        ph,
        column_list()
    );
    q
}

/// Idempotent table bootstrap.
pub fn create_table() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT NOT NULL, {} BOOLEAN NOT NULL)",
        quoted(TODO_TABLE),
        quoted(FIELD_ID),
        quoted(FIELD_TASK),
        quoted(FIELD_IS_DONE)
    )
}
