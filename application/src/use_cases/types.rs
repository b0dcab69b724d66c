//! Error type shared by the workflow use cases.

use crate::ports::llm_gateway::GatewayError;
use crate::ports::memory_store::StoreError;
use agentflow_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while running the plan/step workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("User id is required")]
    MissingUser,

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Request was rejected by the content safety check")]
    UnsafeContent,

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl WorkflowError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled)
            || matches!(self, WorkflowError::Domain(e) if e.is_cancelled())
    }

    /// Whether the error was caused by the caller's input rather than by a
    /// failing dependency.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::MissingUser
                | WorkflowError::UnsafeContent
                | WorkflowError::Domain(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkflowError::PlanNotFound(_)
                | WorkflowError::StepNotFound(_)
                | WorkflowError::Store(StoreError::NotFound { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(WorkflowError::MissingUser.is_client_error());
        assert!(WorkflowError::Domain(DomainError::EmptyGoal).is_client_error());
        assert!(!WorkflowError::Gateway(GatewayError::Timeout).is_client_error());
        assert!(WorkflowError::PlanNotFound("p".into()).is_not_found());
        assert!(WorkflowError::Domain(DomainError::Cancelled).is_cancelled());
    }
}
