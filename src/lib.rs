//! Instrumented Concurrent Fibonacci Service Library

pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use engine::{Engine, TaskContext};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
