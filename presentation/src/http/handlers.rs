//! Route handlers
//!
//! Every handler resolves the caller from the request headers, delegates to
//! the [`WorkflowService`](agentflow_application::WorkflowService) and maps
//! its errors through [`ApiError`].

use super::auth::get_authenticated_user_details;
use super::error::ApiError;
use super::state::AppState;
use agentflow_application::{ApprovalResult, ClarificationAccepted, FeedbackAccepted, TaskAccepted};
use agentflow_domain::{
    AgentMessage, HumanClarification, HumanFeedback, InputTask, PlanId, PlanWithSteps, SessionId,
    Step, ToolSummary, UserId,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

type ApiResult<T> = Result<Json<T>, ApiError>;

fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let user = get_authenticated_user_details(headers);
    if user.user_principal_id.is_empty() {
        warn!("No user principal id in request");
        return Err(ApiError::NoUser);
    }
    Ok(user.user_id())
}

/// POST /api/input_task
pub async fn input_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(task): Json<InputTask>,
) -> ApiResult<TaskAccepted> {
    let user = require_user(&headers)?;
    info!("Received input task for user {user}");
    Ok(Json(state.workflow.submit_task(&user, task).await?))
}

/// POST /api/human_feedback
pub async fn human_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(feedback): Json<HumanFeedback>,
) -> ApiResult<FeedbackAccepted> {
    let user = require_user(&headers)?;
    Ok(Json(state.workflow.submit_feedback(&user, feedback).await?))
}

/// POST /api/human_clarification_on_plan
pub async fn human_clarification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(clarification): Json<HumanClarification>,
) -> ApiResult<ClarificationAccepted> {
    let user = require_user(&headers)?;
    Ok(Json(
        state.workflow.submit_clarification(&user, clarification).await?,
    ))
}

/// POST /api/approve_step_or_steps
pub async fn approve_step_or_steps(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(feedback): Json<HumanFeedback>,
) -> ApiResult<ApprovalResult> {
    let user = require_user(&headers)?;
    Ok(Json(state.workflow.approve_steps(&user, feedback).await?))
}

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    pub session_id: Option<SessionId>,
}

/// GET /api/plans
pub async fn plans(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PlansQuery>,
) -> ApiResult<Vec<PlanWithSteps>> {
    let user = require_user(&headers)?;
    let plans = state
        .workflow
        .list_plans(&user, query.session_id.as_ref())
        .await?;
    if query.session_id.is_some() && plans.is_empty() {
        return Err(ApiError::NotFound("Plan not found".to_string()));
    }
    Ok(Json(plans))
}

/// GET /api/steps/:plan_id
pub async fn steps_by_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plan_id): Path<PlanId>,
) -> ApiResult<Vec<Step>> {
    let user = require_user(&headers)?;
    Ok(Json(state.workflow.list_steps(&user, &plan_id).await?))
}

/// GET /api/agent_messages/:session_id
pub async fn agent_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Vec<AgentMessage>> {
    let user = require_user(&headers)?;
    Ok(Json(
        state.workflow.list_agent_messages(&user, &session_id).await?,
    ))
}

/// DELETE /api/messages
pub async fn delete_all_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let user = require_user(&headers)?;
    state.workflow.delete_all(&user).await?;
    Ok(Json(json!({ "status": "All messages deleted" })))
}

/// GET /api/messages
pub async fn all_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Value>> {
    let user = require_user(&headers)?;
    Ok(Json(state.workflow.list_all_items(&user).await?))
}

/// GET /api/agent-tools
pub async fn agent_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolSummary>> {
    Json(state.workflow.agent_tools())
}

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub code: Option<String>,
}

/// GET /healthz
pub async fn healthz(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthQuery>,
) -> Response {
    let summary = state.health.run().await;
    let status = if summary.status {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let authorized = state
        .health_password
        .as_deref()
        .is_some_and(|password| query.code.as_deref() == Some(password));
    if authorized {
        return (status, Json(summary)).into_response();
    }

    let text = if summary.status { "OK" } else { "Service Unavailable" };
    (status, text).into_response()
}
