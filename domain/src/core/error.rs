//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid step transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Task description must not be empty")]
    EmptyGoal,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    pub(crate) fn transition(from: impl ToString, to: impl ToString) -> Self {
        DomainError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyGoal.is_cancelled());
        assert!(!DomainError::InvalidPlan("x".to_string()).is_cancelled());
    }

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::transition("completed", "action_requested");
        assert_eq!(
            error.to_string(),
            "Invalid step transition from completed to action_requested"
        );
    }
}
