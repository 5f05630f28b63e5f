//! TodoService: the resource's callable surface. Every method builds a hook
//! context, runs the pipeline, and publishes a service event after mutations.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::{EventBus, ServiceEvent};
use crate::pipeline::{HookContext, Method, Params, Pipeline};
use crate::resolver::ResolverSet;
use crate::schema::TODO_TABLE;
use crate::store::ResourceAdapter;
use serde_json::Value;
use std::sync::Arc;

pub const TODO_PATH: &str = TODO_TABLE;

pub struct TodoService {
    pipeline: Pipeline,
    events: EventBus,
}

impl TodoService {
    pub fn new(
        adapter: Arc<dyn ResourceAdapter>,
        resolvers: ResolverSet,
        config: &AppConfig,
        events: EventBus,
    ) -> Self {
        TodoService {
            pipeline: Pipeline::todo(adapter, resolvers, config.paginate, config.request_timeout),
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// One page: `{total, limit, skip, data}`.
    pub async fn find(&self, params: Params) -> Result<Value, AppError> {
        self.call(HookContext::new(Method::Find, None, params)).await
    }

    pub async fn get(&self, id: i64, params: Params) -> Result<Value, AppError> {
        self.call(HookContext::new(Method::Get, Some(id), params)).await
    }

    pub async fn create(&self, data: Value, params: Params) -> Result<Value, AppError> {
        self.call(HookContext::new(Method::Create, None, params).with_data(data))
            .await
    }

    pub async fn patch(&self, id: i64, data: Value, params: Params) -> Result<Value, AppError> {
        self.call(HookContext::new(Method::Patch, Some(id), params).with_data(data))
            .await
    }

    pub async fn remove(&self, id: i64, params: Params) -> Result<Value, AppError> {
        self.call(HookContext::new(Method::Remove, Some(id), params)).await
    }

    async fn call(&self, ctx: HookContext) -> Result<Value, AppError> {
        let method = ctx.method;
        let ctx = self.pipeline.run(ctx).await?;
        let result = ctx
            .result
            .ok_or_else(|| AppError::Internal(format!("{} produced no result", method.as_str())))?;
        if let Some(event) = method.event() {
            self.events.publish(ServiceEvent {
                path: TODO_PATH,
                event,
                data: result.clone(),
            });
        }
        Ok(result)
    }
}
