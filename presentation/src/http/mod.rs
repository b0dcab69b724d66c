//! HTTP API

pub mod auth;
pub mod error;
pub mod handlers;
pub mod health;
pub mod router;
pub mod state;

pub use auth::{UserDetails, get_authenticated_user_details, get_tenantid};
pub use error::ApiError;
pub use health::{HealthCheckResult, HealthCheckSummary, HealthChecks};
pub use router::{RouterConfig, create_router};
pub use state::AppState;
