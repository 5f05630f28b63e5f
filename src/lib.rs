//! Todo service: a schema-validated CRUD resource over SQLite, served over REST
//! with a server-sent event stream of mutations.

pub mod config;
pub mod error;
pub mod events;
pub mod extractors;
pub mod handlers;
pub mod pipeline;
pub mod query;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, PaginateConfig, StoreConfig};
pub use error::{AppError, ConfigError, ValidationError};
pub use events::{EventBus, ServiceEvent};
pub use pipeline::{Params, Pipeline};
pub use resolver::{Resolver, ResolverSet};
pub use routes::{app, common_routes, todo_routes};
pub use schema::{Todo, TodoData, TodoPatch};
pub use service::TodoService;
pub use state::AppState;
pub use store::{connect, ensure_schema, ResourceAdapter, TodoStore};
