//! Shared application state for all routes.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::EventBus;
use crate::resolver::ResolverSet;
use crate::service::TodoService;
use crate::store::{connect, ensure_schema, TodoStore};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub service: Arc<TodoService>,
}

impl AppState {
    /// Wires the todo service over an already connected pool.
    pub fn new(pool: SqlitePool, config: &AppConfig, resolvers: ResolverSet) -> Self {
        let service = TodoService::new(
            Arc::new(TodoStore::new(pool.clone())),
            resolvers,
            config,
            EventBus::default(),
        );
        AppState {
            pool,
            service: Arc::new(service),
        }
    }

    /// Connects the store, creates the table if needed and wires the service.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = connect(&config.store).await?;
        ensure_schema(&pool).await?;
        Ok(AppState::new(pool, config, ResolverSet::todo()))
    }
}
