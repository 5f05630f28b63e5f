//! Per-call context threaded through every pipeline stage.

use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Find,
    Get,
    Create,
    Patch,
    Remove,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Find => "find",
            Method::Get => "get",
            Method::Create => "create",
            Method::Patch => "patch",
            Method::Remove => "remove",
        }
    }

    /// Service event published after a successful call, if any.
    pub fn event(self) -> Option<&'static str> {
        match self {
            Method::Create => Some("created"),
            Method::Patch => Some("patched"),
            Method::Remove => Some("removed"),
            Method::Find | Method::Get => None,
        }
    }
}

/// Transport a call arrived through. Absent for in-process calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Rest,
}

#[derive(Clone, Debug, Default)]
pub struct Params {
    pub provider: Option<Provider>,
    /// Caller identity as reported by the transport.
    pub caller: Option<String>,
    /// Query object: filters and `$`-operators, nested by bracket segments.
    pub query: Map<String, Value>,
}

impl Params {
    pub fn internal() -> Self {
        Params::default()
    }

    pub fn rest(query: Map<String, Value>, caller: Option<String>) -> Self {
        Params {
            provider: Some(Provider::Rest),
            caller,
            query,
        }
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    pub fn is_external(&self) -> bool {
        self.provider.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct HookContext {
    pub method: Method,
    pub id: Option<i64>,
    pub params: Params,
    /// Create/patch payload. Replaced by its validated form before dispatch.
    pub data: Option<Value>,
    /// Set by adapter dispatch; a record, or a page object for `find`.
    pub result: Option<Value>,
}

impl HookContext {
    pub fn new(method: Method, id: Option<i64>, params: Params) -> Self {
        HookContext {
            method,
            id,
            params,
            data: None,
            result: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
