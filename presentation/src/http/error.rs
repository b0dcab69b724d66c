//! HTTP error responses

use agentflow_application::WorkflowError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no user")]
    NoUser,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoUser | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::MissingUser => ApiError::NoUser,
            WorkflowError::UnsafeContent => ApiError::BadRequest(
                "Request contains content that doesn't meet our safety guidelines, try again."
                    .to_string(),
            ),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e if e.is_cancelled() => ApiError::Unavailable(e.to_string()),
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            WorkflowError::Gateway(e) => ApiError::BadGateway(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_application::{GatewayError, StoreError};

    #[test]
    fn test_workflow_error_status() {
        let cases = [
            (WorkflowError::MissingUser, StatusCode::BAD_REQUEST),
            (WorkflowError::UnsafeContent, StatusCode::BAD_REQUEST),
            (WorkflowError::PlanNotFound("p1".into()), StatusCode::NOT_FOUND),
            (WorkflowError::StepNotFound("s1".into()), StatusCode::NOT_FOUND),
            (
                WorkflowError::Store(StoreError::Backend("disk full".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                WorkflowError::Gateway(GatewayError::Timeout),
                StatusCode::BAD_GATEWAY,
            ),
            (WorkflowError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_no_user_detail() {
        assert_eq!(ApiError::from(WorkflowError::MissingUser).to_string(), "no user");
    }
}
