//! Presentation layer for agentflow
//!
//! This crate contains the CLI definition and the HTTP API: routes,
//! caller authentication, error responses and health checks.

pub mod cli;
pub mod http;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use http::{
    ApiError, AppState, HealthCheckResult, HealthChecks, RouterConfig, create_router,
};
