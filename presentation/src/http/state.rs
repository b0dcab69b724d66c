//! Shared state of the HTTP handlers

use super::health::HealthChecks;
use agentflow_application::WorkflowService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowService>,
    pub health: HealthChecks,
    /// Password that unlocks the detailed `/healthz` summary.
    pub health_password: Option<String>,
}

impl AppState {
    pub fn new(workflow: Arc<WorkflowService>) -> Self {
        Self {
            workflow,
            health: HealthChecks::new(),
            health_password: None,
        }
    }

    pub fn with_health_checks(mut self, checks: HealthChecks) -> Self {
        self.health = checks;
        self
    }

    pub fn with_health_password(mut self, password: Option<String>) -> Self {
        self.health_password = password.filter(|p| !p.is_empty());
        self
    }
}
