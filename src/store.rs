//! SQLite store: pool construction, table bootstrap, and the todo adapter.

use crate::config::StoreConfig;
use crate::error::AppError;
use crate::query::{FilterQuery, Page};
use crate::schema::{Todo, TodoData, TodoPatch, FIELD_ID, FIELD_IS_DONE, FIELD_TASK};
use crate::sql::{self, bind_all, QueryBuf};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// CRUD operations the request pipeline dispatches to.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    async fn find(&self, query: &FilterQuery) -> Result<Page<Todo>, AppError>;
    async fn get(&self, id: i64) -> Result<Todo, AppError>;
    async fn create(&self, data: &TodoData) -> Result<Todo, AppError>;
    async fn patch(&self, id: i64, patch: &TodoPatch) -> Result<Todo, AppError>;
    async fn remove(&self, id: i64) -> Result<Todo, AppError>;
}

/// Open the pool. In-memory databases live as long as their connection, so they
/// get exactly one connection that never expires.
pub async fn connect(config: &StoreConfig) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    let pool_options = if config.is_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };
    let pool = pool_options.connect_with(options).await?;
    tracing::info!(url = %config.url, "store connected");
    Ok(pool)
}

/// Create the todo table if it does not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(&sql::create_table()).execute(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct TodoStore {
    pool: SqlitePool,
}

impl TodoStore {
    pub fn new(pool: SqlitePool) -> Self {
        TodoStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Todo>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_todo).transpose()?)
    }
}

#[async_trait]
impl ResourceAdapter for TodoStore {
    async fn find(&self, query: &FilterQuery) -> Result<Page<Todo>, AppError> {
        let c = sql::count(query);
        tracing::debug!(sql = %c.sql, params = ?c.params, "query");
        let total: i64 = bind_all(sqlx::query(&c.sql), &c.params)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let data = if query.limit == 0 {
            Vec::new()
        } else {
            let q = sql::select_page(query);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query");
            let rows = bind_all(sqlx::query(&q.sql), &q.params)
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_todo).collect::<Result<Vec<_>, _>>()?
        };

        Ok(Page {
            total: total.max(0) as u64,
            limit: query.limit,
            skip: query.skip,
            data,
        })
    }

    async fn get(&self, id: i64) -> Result<Todo, AppError> {
        self.fetch_optional(&sql::select_by_id(id))
            .await?
            .ok_or(AppError::NotFound(id))
    }

    async fn create(&self, data: &TodoData) -> Result<Todo, AppError> {
        self.fetch_optional(&sql::insert(data))
            .await?
            .ok_or_else(|| AppError::Internal("insert returned no row".into()))
    }

    async fn patch(&self, id: i64, patch: &TodoPatch) -> Result<Todo, AppError> {
        self.fetch_optional(&sql::update(id, patch))
            .await?
            .ok_or(AppError::NotFound(id))
    }

    async fn remove(&self, id: i64) -> Result<Todo, AppError> {
        self.fetch_optional(&sql::delete(id))
            .await?
            .ok_or(AppError::NotFound(id))
    }
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo, sqlx::Error> {
    Ok(Todo {
        id: row.try_get(FIELD_ID)?,
        task: row.try_get(FIELD_TASK)?,
        is_done: row.try_get(FIELD_IS_DONE)?,
    })
}
