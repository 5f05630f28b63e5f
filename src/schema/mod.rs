//! Todo resource schema: data shapes and the strict validator derived from their declarations.

pub mod todo;
mod validator;

pub use todo::*;
pub use validator::{SchemaValidator, DATA_SCHEMA, PATCH_SCHEMA, QUERY_SCHEMA};
