//! HTTP handlers for the todo resource and its event stream.

pub mod events;
pub mod todo;

pub use events::*;
pub use todo::*;
