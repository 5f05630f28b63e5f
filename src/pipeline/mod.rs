//! Request pipeline: a static, ordered list of hooks run per call.
//!
//! Order: validate query, resolve query, validate data, resolve data, adapter
//! dispatch, resolve result, resolve external. The first failing stage ends the
//! call. The whole run is bounded by the request timeout, and every failure
//! passes the error-logging boundary once before it is returned.

mod context;
mod hooks;

pub use context::*;
pub use hooks::*;

use crate::config::PaginateConfig;
use crate::error::AppError;
use crate::resolver::ResolverSet;
use crate::store::ResourceAdapter;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One pipeline stage: `(context) -> context`.
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, ctx: HookContext) -> Result<HookContext, AppError>;
}

pub struct Pipeline {
    stages: Vec<Arc<dyn Hook>>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Hook>>, timeout: Duration) -> Self {
        Pipeline { stages, timeout }
    }

    /// The todo resource pipeline.
    pub fn todo(
        adapter: Arc<dyn ResourceAdapter>,
        resolvers: ResolverSet,
        paginate: PaginateConfig,
        timeout: Duration,
    ) -> Self {
        let stages: Vec<Arc<dyn Hook>> = vec![
            Arc::new(ValidateQuery),
            Arc::new(ResolveQuery(resolvers.query)),
            Arc::new(ValidateData),
            Arc::new(ResolveData {
                create: resolvers.data,
                patch: resolvers.patch,
            }),
            Arc::new(InvokeAdapter { adapter, paginate }),
            Arc::new(ResolveResult {
                resolver: resolvers.result,
                external: false,
            }),
            Arc::new(ResolveResult {
                resolver: resolvers.external,
                external: true,
            }),
        ];
        Pipeline::new(stages, timeout)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, ctx: HookContext) -> Result<HookContext, AppError> {
        let method = ctx.method;
        let id = ctx.id;
        let outcome = match tokio::time::timeout(self.timeout, self.run_stages(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.timeout.as_millis())),
        };
        outcome.map_err(|err| log_error(method, id, err))
    }

    async fn run_stages(&self, mut ctx: HookContext) -> Result<HookContext, AppError> {
        for stage in &self.stages {
            tracing::trace!(stage = stage.name(), method = ctx.method.as_str(), "hook");
            ctx = stage.call(ctx).await?;
        }
        Ok(ctx)
    }
}

/// Outermost boundary: unexpected errors are logged with their details, expected
/// ones only at debug. The error is returned unchanged.
fn log_error(method: Method, id: Option<i64>, err: AppError) -> AppError {
    if err.is_expected() {
        tracing::debug!(method = method.as_str(), id = ?id, error = %err, "request rejected");
    } else {
        tracing::error!(method = method.as_str(), id = ?id, error = %err, details = ?err, "request failed");
        if let Some(data) = err.data() {
            tracing::error!(data = %data, "error data");
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterQuery, Page};
    use crate::resolver::{resolve_with, Resolver};
    use crate::schema::{Todo, TodoData, TodoPatch};
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter that records calls and answers with fixed rows.
    #[derive(Default)]
    struct FakeAdapter {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeAdapter {
        async fn enter(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
        }
    }

    #[async_trait]
    impl ResourceAdapter for FakeAdapter {
        async fn find(&self, query: &FilterQuery) -> Result<Page<Todo>, AppError> {
            self.enter().await;
            Ok(Page {
                total: 1,
                limit: query.limit,
                skip: query.skip,
                data: vec![Todo { id: 1, task: "a".into(), is_done: false }],
            })
        }
        async fn get(&self, id: i64) -> Result<Todo, AppError> {
            self.enter().await;
            if id == 404 {
                return Err(AppError::NotFound(id));
            }
            Ok(Todo { id, task: "a".into(), is_done: false })
        }
        async fn create(&self, data: &TodoData) -> Result<Todo, AppError> {
            self.enter().await;
            Ok(Todo { id: 7, task: data.task.clone(), is_done: data.is_done })
        }
        async fn patch(&self, id: i64, patch: &TodoPatch) -> Result<Todo, AppError> {
            self.enter().await;
            Ok(Todo {
                id,
                task: patch.task.clone().unwrap_or_else(|| "a".into()),
                is_done: patch.is_done.unwrap_or(false),
            })
        }
        async fn remove(&self, id: i64) -> Result<Todo, AppError> {
            self.get(id).await
        }
    }

    fn pipeline(adapter: Arc<FakeAdapter>, resolvers: ResolverSet) -> Pipeline {
        Pipeline::todo(adapter, resolvers, PaginateConfig::default(), Duration::from_secs(5))
    }

    fn marker(tag: &'static str) -> Resolver {
        Resolver::new().property(
            "tags",
            resolve_with(move |v: Option<Value>, _r, _p| async move {
                let mut tags = v.and_then(|v| v.as_array().cloned()).unwrap_or_default();
                tags.push(Value::from(tag));
                Ok::<_, AppError>(Some(Value::Array(tags)))
            }),
        )
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let p = pipeline(Arc::new(FakeAdapter::default()), ResolverSet::todo());
        assert_eq!(
            p.stage_names(),
            vec![
                "validate_query",
                "resolve_query",
                "validate_data",
                "resolve_data",
                "invoke_adapter",
                "resolve_result",
                "resolve_external",
            ]
        );
    }

    #[tokio::test]
    async fn invalid_data_short_circuits_before_adapter() {
        let adapter = Arc::new(FakeAdapter::default());
        let p = pipeline(adapter.clone(), ResolverSet::todo());
        let ctx = HookContext::new(Method::Create, None, Params::internal()).with_data(json!({ "task": "t" }));
        let err = p.run(ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_query_short_circuits_every_method() {
        let adapter = Arc::new(FakeAdapter::default());
        let p = pipeline(adapter.clone(), ResolverSet::todo());
        let mut query = Map::new();
        query.insert("owner".into(), json!("x"));
        let ctx = HookContext::new(Method::Get, Some(1), Params::internal().with_query(query));
        assert!(matches!(p.run(ctx).await, Err(AppError::Validation(_))));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn external_resolver_only_for_transport_calls() {
        let resolvers = ResolverSet {
            result: marker("result"),
            external: marker("external"),
            ..ResolverSet::todo()
        };
        let p = pipeline(Arc::new(FakeAdapter::default()), resolvers);

        let internal = p.run(HookContext::new(Method::Get, Some(3), Params::internal())).await.unwrap();
        assert_eq!(internal.result.unwrap()["tags"], json!(["result"]));

        let external = p
            .run(HookContext::new(Method::Get, Some(3), Params::rest(Map::new(), None)))
            .await
            .unwrap();
        assert_eq!(external.result.unwrap()["tags"], json!(["result", "external"]));
    }

    #[tokio::test]
    async fn find_results_resolve_per_item() {
        let resolvers = ResolverSet { result: marker("result"), ..ResolverSet::todo() };
        let p = pipeline(Arc::new(FakeAdapter::default()), resolvers);
        let ctx = p.run(HookContext::new(Method::Find, None, Params::internal())).await.unwrap();
        let page = ctx.result.unwrap();
        assert_eq!(page["total"], json!(1));
        assert_eq!(page["limit"], json!(10));
        assert_eq!(page["data"][0]["tags"], json!(["result"]));
    }

    #[tokio::test]
    async fn data_resolvers_run_before_dispatch() {
        let resolvers = ResolverSet {
            data: Resolver::new().property(
                "task",
                resolve_with(|v: Option<Value>, _r, _p| async move {
                    Ok::<_, AppError>(v.map(|v| Value::from(v.as_str().unwrap_or("").trim().to_string())))
                }),
            ),
            ..ResolverSet::todo()
        };
        let p = pipeline(Arc::new(FakeAdapter::default()), resolvers);
        let ctx = HookContext::new(Method::Create, None, Params::internal())
            .with_data(json!({ "task": "  padded  ", "isDone": true }));
        let out = p.run(ctx).await.unwrap();
        assert_eq!(out.result.unwrap(), json!({ "id": 7, "task": "padded", "isDone": true }));
    }

    #[tokio::test]
    async fn adapter_errors_pass_through_unchanged() {
        let p = pipeline(Arc::new(FakeAdapter::default()), ResolverSet::todo());
        let err = p.run(HookContext::new(Method::Remove, Some(404), Params::internal())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(404)));
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let adapter = Arc::new(FakeAdapter { delay: Some(Duration::from_millis(200)), ..Default::default() });
        let p = Pipeline::todo(adapter, ResolverSet::todo(), PaginateConfig::default(), Duration::from_millis(20));
        let err = p.run(HookContext::new(Method::Get, Some(1), Params::internal())).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(20)));
    }
}
