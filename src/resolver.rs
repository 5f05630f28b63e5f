//! Per-field, asynchronous record resolution.
//!
//! A [`Resolver`] holds an ordered list of property resolvers. Each one receives the
//! field's current value, the record as resolved so far, and the call context, and
//! returns the new value (`None` drops the field). A resolver with no properties is
//! the identity.

use crate::error::AppError;
use crate::pipeline::{HookContext, Params};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

pub type Record = Map<String, Value>;

#[async_trait]
pub trait PropertyResolver: Send + Sync {
    async fn resolve(
        &self,
        value: Option<Value>,
        record: &Record,
        ctx: &HookContext,
    ) -> Result<Option<Value>, AppError>;
}

struct FnResolver<F>(F);

#[async_trait]
impl<F, Fut> PropertyResolver for FnResolver<F>
where
    F: Fn(Option<Value>, Record, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, AppError>> + Send + 'static,
{
    async fn resolve(
        &self,
        value: Option<Value>,
        record: &Record,
        ctx: &HookContext,
    ) -> Result<Option<Value>, AppError> {
        (self.0)(value, record.clone(), ctx.params.clone()).await
    }
}

/// Wrap an async closure `(value, record, params)` as a property resolver.
pub fn resolve_with<F, Fut>(f: F) -> Arc<dyn PropertyResolver>
where
    F: Fn(Option<Value>, Record, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, AppError>> + Send + 'static,
{
    Arc::new(FnResolver(f))
}

#[derive(Clone, Default)]
pub struct Resolver {
    properties: Vec<(String, Arc<dyn PropertyResolver>)>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    pub fn property(mut self, name: impl Into<String>, resolver: Arc<dyn PropertyResolver>) -> Self {
        self.properties.push((name.into(), resolver));
        self
    }

    pub fn is_identity(&self) -> bool {
        self.properties.is_empty()
    }

    pub async fn resolve(&self, mut record: Record, ctx: &HookContext) -> Result<Record, AppError> {
        for (name, resolver) in &self.properties {
            let current = record.get(name).cloned();
            match resolver.resolve(current, &record, ctx).await? {
                Some(v) => {
                    record.insert(name.clone(), v);
                }
                None => {
                    record.remove(name);
                }
            }
        }
        Ok(record)
    }

    /// Resolve a JSON value; non-objects pass through untouched.
    pub async fn resolve_value(&self, value: Value, ctx: &HookContext) -> Result<Value, AppError> {
        match value {
            Value::Object(record) if !self.is_identity() => Ok(Value::Object(self.resolve(record, ctx).await?)),
            other => Ok(other),
        }
    }
}

/// The five resolution points of a resource.
#[derive(Clone, Default)]
pub struct ResolverSet {
    pub query: Resolver,
    pub data: Resolver,
    pub patch: Resolver,
    pub result: Resolver,
    pub external: Resolver,
}

impl ResolverSet {
    /// Todo resolvers: identity at every point.
    pub fn todo() -> Self {
        ResolverSet::default()
    }
}
