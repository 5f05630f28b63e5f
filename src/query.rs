//! Query grammar: bracket-notation query strings to a JSON query object, and a
//! validated query object to typed filters, sort and page bounds.

use crate::config::PaginateConfig;
use crate::error::{FieldIssue, ValidationError};
use crate::schema::{field, QUERY_SCHEMA};
use serde::Serialize;
use serde_json::{Map, Value};

/// Nest raw query-string pairs by their bracket segments.
///
/// `task[$ne]=a` becomes `{"task": {"$ne": "a"}}`, `id[$in][]=1&id[$in][]=2`
/// becomes `{"id": {"$in": ["1", "2"]}}`. Repeated plain keys collect into an array.
/// Leaves stay strings; the query validator coerces them.
pub fn parse_query_pairs<I>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut root = Map::new();
    for (key, value) in pairs {
        let (base, segments) = split_key(&key);
        insert_path(&mut root, base, &segments, Value::String(value));
    }
    root
}

fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 || !key.ends_with(']') {
        return (key, Vec::new());
    }
    let base = &key[..open];
    let inner = &key[open + 1..key.len() - 1];
    let segments: Vec<&str> = inner.split("][").collect();
    if segments.iter().any(|s| s.contains('[') || s.contains(']')) {
        return (key, Vec::new());
    }
    (base, segments)
}

fn push_value(slot: &mut Value, value: Value) {
    match slot {
        Value::Array(items) => items.push(value),
        other => {
            let prev = other.take();
            *other = Value::Array(vec![prev, value]);
        }
    }
}

fn insert_path(map: &mut Map<String, Value>, key: &str, rest: &[&str], value: Value) {
    match rest {
        [] => match map.get_mut(key) {
            Some(existing) => push_value(existing, value),
            None => {
                map.insert(key.to_string(), value);
            }
        },
        [""] => {
            let slot = map.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
            push_value(slot, value);
        }
        [next, tail @ ..] => {
            let slot = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, next, tail, value);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub condition: Condition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A validated `find` query. `limit` is already clamped to the configured maximum.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<(&'static str, SortDirection)>,
    pub limit: u64,
    pub skip: u64,
}

impl FilterQuery {
    pub fn all(paginate: &PaginateConfig) -> Self {
        FilterQuery {
            filters: Vec::new(),
            sort: Vec::new(),
            limit: paginate.limit(None),
            skip: 0,
        }
    }

    /// Convert a query object that already passed `SchemaValidator::validate_query`.
    pub fn from_query(query: &Map<String, Value>, paginate: &PaginateConfig) -> Result<Self, ValidationError> {
        let mut out = FilterQuery::all(paginate);
        for (key, value) in query {
            match key.as_str() {
                "$limit" => out.limit = paginate.limit(Some(count(key, value)?)),
                "$skip" => out.skip = count(key, value)?,
                "$sort" => {
                    let Value::Object(sort) = value else {
                        return Err(invalid(key, "must be an object"));
                    };
                    for (name, dir) in sort {
                        let spec = field(name).ok_or_else(|| unknown(name))?;
                        let dir = if dir.as_i64() == Some(-1) { SortDirection::Desc } else { SortDirection::Asc };
                        out.sort.push((spec.name, dir));
                    }
                }
                name => {
                    let spec = field(name).ok_or_else(|| unknown(name))?;
                    match value {
                        Value::Object(ops) => {
                            for (op, operand) in ops {
                                out.filters.push(Filter {
                                    field: spec.name,
                                    condition: condition(name, op, operand)?,
                                });
                            }
                        }
                        scalar => out.filters.push(Filter {
                            field: spec.name,
                            condition: Condition::Eq(scalar.clone()),
                        }),
                    }
                }
            }
        }
        Ok(out)
    }
}

fn count(key: &str, v: &Value) -> Result<u64, ValidationError> {
    v.as_u64().ok_or_else(|| invalid(key, "must be a non-negative integer"))
}

fn condition(name: &str, op: &str, operand: &Value) -> Result<Condition, ValidationError> {
    let list = || match operand {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    Ok(match op {
        "$ne" => Condition::Ne(operand.clone()),
        "$gt" => Condition::Gt(operand.clone()),
        "$gte" => Condition::Gte(operand.clone()),
        "$lt" => Condition::Lt(operand.clone()),
        "$lte" => Condition::Lte(operand.clone()),
        "$in" => Condition::In(list()),
        "$nin" => Condition::Nin(list()),
        other => {
            return Err(ValidationError::single(
                QUERY_SCHEMA,
                format!("{}.{}", name, other),
                FieldIssue::UnknownOperator { operator: other.to_string() },
            ))
        }
    })
}

fn invalid(key: &str, detail: &str) -> ValidationError {
    ValidationError::single(QUERY_SCHEMA, key, FieldIssue::InvalidValue { detail: detail.into() })
}

fn unknown(name: &str) -> ValidationError {
    ValidationError::single(QUERY_SCHEMA, name, FieldIssue::UnknownField)
}

/// One page of `find` results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub limit: u64,
    pub skip: u64,
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaValidator;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn nests_bracket_keys() {
        let q = parse_query_pairs(pairs(&[
            ("$limit", "5"),
            ("task[$ne]", "a"),
            ("id[$in][]", "1"),
            ("id[$in][]", "2"),
            ("$sort[id]", "-1"),
        ]));
        assert_eq!(
            Value::Object(q),
            json!({
                "$limit": "5",
                "task": { "$ne": "a" },
                "id": { "$in": ["1", "2"] },
                "$sort": { "id": "-1" }
            })
        );
    }

    #[test]
    fn repeated_plain_keys_collect() {
        let q = parse_query_pairs(pairs(&[("task", "a"), ("task", "b")]));
        assert_eq!(q["task"], json!(["a", "b"]));
    }

    #[test]
    fn malformed_brackets_stay_literal() {
        let q = parse_query_pairs(pairs(&[("task[$ne", "a"), ("[x]", "b")]));
        assert_eq!(q["task[$ne"], json!("a"));
        assert_eq!(q["[x]"], json!("b"));
    }

    #[test]
    fn builds_typed_query() {
        let raw = parse_query_pairs(pairs(&[
            ("$limit", "100"),
            ("$skip", "20"),
            ("isDone", "false"),
            ("id[$gt]", "3"),
            ("$sort[task]", "1"),
            ("$sort[id]", "-1"),
        ]));
        let validated = SchemaValidator::validate_query(&raw).unwrap();
        let q = FilterQuery::from_query(&validated, &PaginateConfig::default()).unwrap();
        assert_eq!(q.limit, 50);
        assert_eq!(q.skip, 20);
        assert_eq!(
            q.filters,
            vec![
                Filter { field: "isDone", condition: Condition::Eq(json!(false)) },
                Filter { field: "id", condition: Condition::Gt(json!(3)) },
            ]
        );
        assert_eq!(q.sort, vec![("task", SortDirection::Asc), ("id", SortDirection::Desc)]);
    }

    #[test]
    fn empty_query_uses_default_page() {
        let q = FilterQuery::from_query(&Map::new(), &PaginateConfig::default()).unwrap();
        assert_eq!(q, FilterQuery::all(&PaginateConfig::default()));
        assert_eq!(q.limit, 10);
    }
}
