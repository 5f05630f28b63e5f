//! The pipeline stages, in the order they run.

use crate::config::PaginateConfig;
use crate::error::AppError;
use crate::pipeline::{Hook, HookContext, Method};
use crate::query::FilterQuery;
use crate::resolver::Resolver;
use crate::schema::{SchemaValidator, TodoData, TodoPatch, DATA_SCHEMA, PATCH_SCHEMA};
use crate::store::ResourceAdapter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct ValidateQuery;

#[async_trait]
impl Hook for ValidateQuery {
    fn name(&self) -> &'static str {
        "validate_query"
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        ctx.params.query = SchemaValidator::validate_query(&ctx.params.query)?;
        Ok(ctx)
    }
}

pub struct ResolveQuery(pub Resolver);

#[async_trait]
impl Hook for ResolveQuery {
    fn name(&self) -> &'static str {
        "resolve_query"
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        if !self.0.is_identity() {
            let query = std::mem::take(&mut ctx.params.query);
            ctx.params.query = self.0.resolve(query, &ctx).await?;
        }
        Ok(ctx)
    }
}

/// Create bodies check against `TodoData`, patch bodies against `TodoPatch`.
pub struct ValidateData;

#[async_trait]
impl Hook for ValidateData {
    fn name(&self) -> &'static str {
        "validate_data"
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        if !matches!(ctx.method, Method::Create | Method::Patch) {
            return Ok(ctx);
        }
        let body = ctx.data.take().unwrap_or(Value::Null);
        let validated = if ctx.method == Method::Create {
            to_json(SchemaValidator::validate_data(&body)?)?
        } else {
            to_json(SchemaValidator::validate_patch(&body)?)?
        };
        ctx.data = Some(validated);
        Ok(ctx)
    }
}

pub struct ResolveData {
    pub create: Resolver,
    pub patch: Resolver,
}

#[async_trait]
impl Hook for ResolveData {
    fn name(&self) -> &'static str {
        "resolve_data"
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        let resolver = match ctx.method {
            Method::Create => &self.create,
            Method::Patch => &self.patch,
            _ => return Ok(ctx),
        };
        if let Some(data) = ctx.data.take() {
            ctx.data = Some(resolver.resolve_value(data, &ctx).await?);
        }
        Ok(ctx)
    }
}

/// Dispatch to the store adapter by method name.
pub struct InvokeAdapter {
    pub adapter: Arc<dyn ResourceAdapter>,
    pub paginate: PaginateConfig,
}

#[async_trait]
impl Hook for InvokeAdapter {
    fn name(&self) -> &'static str {
        "invoke_adapter"
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        let result = match ctx.method {
            Method::Find => {
                let query = FilterQuery::from_query(&ctx.params.query, &self.paginate)?;
                to_json(self.adapter.find(&query).await?)?
            }
            Method::Get => to_json(self.adapter.get(require_id(&ctx)?).await?)?,
            Method::Create => {
                let data: TodoData = from_data(&ctx, DATA_SCHEMA)?;
                to_json(self.adapter.create(&data).await?)?
            }
            Method::Patch => {
                let patch: TodoPatch = from_data(&ctx, PATCH_SCHEMA)?;
                to_json(self.adapter.patch(require_id(&ctx)?, &patch).await?)?
            }
            Method::Remove => to_json(self.adapter.remove(require_id(&ctx)?).await?)?,
        };
        ctx.result = Some(result);
        Ok(ctx)
    }
}

/// Result resolution. `external` stages run only for transport calls.
pub struct ResolveResult {
    pub resolver: Resolver,
    pub external: bool,
}

#[async_trait]
impl Hook for ResolveResult {
    fn name(&self) -> &'static str {
        if self.external {
            "resolve_external"
        } else {
            "resolve_result"
        }
    }

    async fn call(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        if self.resolver.is_identity() || (self.external && !ctx.params.is_external()) {
            return Ok(ctx);
        }
        let Some(result) = ctx.result.take() else {
            return Ok(ctx);
        };
        let resolved = match (ctx.method, result) {
            (Method::Find, Value::Object(mut page)) => {
                if let Some(Value::Array(items)) = page.remove("data") {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.resolver.resolve_value(item, &ctx).await?);
                    }
                    page.insert("data".into(), Value::Array(out));
                }
                Value::Object(page)
            }
            (_, record) => self.resolver.resolve_value(record, &ctx).await?,
        };
        ctx.result = Some(resolved);
        Ok(ctx)
    }
}

fn require_id(ctx: &HookContext) -> Result<i64, AppError> {
    ctx.id
        .ok_or_else(|| AppError::Internal(format!("{} requires an id", ctx.method.as_str())))
}

fn from_data<T: serde::de::DeserializeOwned>(ctx: &HookContext, schema: &str) -> Result<T, AppError> {
    let data = ctx.data.clone().unwrap_or(Value::Null);
    serde_json::from_value(data)
        .map_err(|e| AppError::Internal(format!("resolved data does not match {}: {}", schema, e)))
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}
