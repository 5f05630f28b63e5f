//! Application configuration, read from the environment.

mod app;

pub use app::*;
