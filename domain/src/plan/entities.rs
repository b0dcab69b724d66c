//! Plan and step entities and the step state machine.
//!
//! A [`Plan`] is created once per task from the planner's output and owns an
//! ordered list of [`Step`]s. Steps move through:
//!
//! ```text
//!             approve              dispatch                 reply
//!  planned ─────────────▶ approved ────────▶ action_requested ─────▶ completed
//!     │                                              │
//!     │ reject                                       │ error
//!     ▼                                              ▼
//!  rejected                                        failed
//! ```
//!
//! `completed`, `rejected` and `failed` are terminal. Applying an operation
//! to a step that has already reached its target (or any terminal state)
//! reports [`StepTransition::Unchanged`] instead of failing, so replays of
//! the same feedback or response are harmless.

use super::value_objects::{PlanId, SessionId, StepId, UserId};
use crate::agent::agent_type::AgentType;
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall status of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::InProgress => "in_progress",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Planned,
    Approved,
    Rejected,
    ActionRequested,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Planned => "planned",
            StepStatus::Approved => "approved",
            StepStatus::Rejected => "rejected",
            StepStatus::ActionRequested => "action_requested",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Rejected | StepStatus::Failed
        )
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human approval state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HumanFeedbackStatus {
    #[default]
    Requested,
    Accepted,
    Rejected,
}

impl HumanFeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HumanFeedbackStatus::Requested => "requested",
            HumanFeedbackStatus::Accepted => "accepted",
            HumanFeedbackStatus::Rejected => "rejected",
        }
    }
}

/// Outcome of applying an operation to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    /// The step was modified and must be persisted.
    Applied,
    /// The step was already in the requested state; nothing changed.
    Unchanged,
}

impl StepTransition {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepTransition::Applied)
    }
}

/// A plan created by the planner for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub initial_goal: String,
    #[serde(default)]
    pub overall_status: PlanStatus,
    #[serde(default = "default_plan_source")]
    pub source: AgentType,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub human_clarification_request: Option<String>,
    #[serde(default)]
    pub human_clarification_response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn default_plan_source() -> AgentType {
    AgentType::Planner
}

impl Plan {
    pub fn new(
        session_id: impl Into<SessionId>,
        user_id: impl Into<UserId>,
        initial_goal: impl Into<String>,
    ) -> Self {
        Self {
            id: PlanId::generate(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            initial_goal: initial_goal.into(),
            overall_status: PlanStatus::InProgress,
            source: AgentType::Planner,
            summary: None,
            human_clarification_request: None,
            human_clarification_response: None,
            timestamp: Utc::now(),
        }
    }

    /// The plan reported when the planner could not produce one: no id, no
    /// steps, status `failed`.
    pub fn failed(
        session_id: impl Into<SessionId>,
        user_id: impl Into<UserId>,
        initial_goal: impl Into<String>,
    ) -> Self {
        Self {
            id: PlanId::default(),
            overall_status: PlanStatus::Failed,
            ..Self::new(session_id, user_id, initial_goal)
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_clarification_request(mut self, request: impl Into<String>) -> Self {
        self.human_clarification_request = Some(request.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.overall_status == PlanStatus::Failed
    }

    /// Marks the plan completed once every step is terminal.
    ///
    /// Returns `true` if the status changed. A failed plan never changes.
    pub fn refresh_status(&mut self, steps: &[Step]) -> bool {
        if self.overall_status != PlanStatus::InProgress || steps.is_empty() {
            return false;
        }
        if steps.iter().all(|s| s.status.is_terminal()) {
            self.overall_status = PlanStatus::Completed;
            return true;
        }
        false
    }
}

/// One action of a plan, owned by a single agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub plan_id: PlanId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub action: String,
    pub agent: AgentType,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub agent_reply: Option<String>,
    #[serde(default)]
    pub human_feedback: Option<String>,
    #[serde(default)]
    pub human_approval_status: HumanFeedbackStatus,
    #[serde(default)]
    pub updated_action: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Step {
    pub fn new(plan: &Plan, action: impl Into<String>, agent: AgentType) -> Self {
        Self {
            id: StepId::generate(),
            plan_id: plan.id.clone(),
            session_id: plan.session_id.clone(),
            user_id: plan.user_id.clone(),
            action: action.into(),
            agent,
            status: StepStatus::Planned,
            agent_reply: None,
            human_feedback: None,
            human_approval_status: HumanFeedbackStatus::Requested,
            updated_action: None,
            timestamp: Utc::now(),
        }
    }

    /// The action to perform: the human's revision if there is one.
    pub fn effective_action(&self) -> &str {
        self.updated_action.as_deref().unwrap_or(&self.action)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records human feedback.
    ///
    /// `Some(true)` approves, `Some(false)` rejects, `None` only records the
    /// feedback text. Terminal steps are left untouched.
    pub fn apply_feedback(
        &mut self,
        approved: Option<bool>,
        feedback: Option<String>,
    ) -> Result<StepTransition, DomainError> {
        if self.is_terminal() {
            return Ok(StepTransition::Unchanged);
        }
        match (self.status, approved) {
            (StepStatus::ActionRequested, Some(true)) => return Ok(StepTransition::Unchanged),
            (StepStatus::ActionRequested, Some(false)) => {
                return Err(DomainError::transition(self.status, StepStatus::Rejected));
            }
            (_, Some(true)) => {
                self.status = StepStatus::Approved;
                self.human_approval_status = HumanFeedbackStatus::Accepted;
            }
            (_, Some(false)) => {
                self.status = StepStatus::Rejected;
                self.human_approval_status = HumanFeedbackStatus::Rejected;
            }
            (_, None) => {}
        }
        self.human_feedback = feedback;
        self.timestamp = Utc::now();
        Ok(StepTransition::Applied)
    }

    /// Moves the step to `action_requested` before it is dispatched.
    pub fn request_action(&mut self) -> Result<StepTransition, DomainError> {
        match self.status {
            StepStatus::Planned | StepStatus::Approved => {
                self.status = StepStatus::ActionRequested;
                self.timestamp = Utc::now();
                Ok(StepTransition::Applied)
            }
            StepStatus::ActionRequested => Ok(StepTransition::Unchanged),
            other => Err(DomainError::transition(other, StepStatus::ActionRequested)),
        }
    }

    /// Records the owning agent's reply.
    pub fn complete(&mut self, reply: impl Into<String>) -> Result<StepTransition, DomainError> {
        match self.status {
            StepStatus::Planned | StepStatus::Approved | StepStatus::ActionRequested => {
                self.status = StepStatus::Completed;
                self.agent_reply = Some(reply.into());
                self.timestamp = Utc::now();
                Ok(StepTransition::Applied)
            }
            StepStatus::Completed => Ok(StepTransition::Unchanged),
            other => Err(DomainError::transition(other, StepStatus::Completed)),
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> StepTransition {
        if self.is_terminal() {
            return StepTransition::Unchanged;
        }
        self.status = StepStatus::Failed;
        self.agent_reply = Some(reason.into());
        self.timestamp = Utc::now();
        StepTransition::Applied
    }
}

/// A plan together with its steps and per-status counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWithSteps {
    #[serde(flatten)]
    pub plan: Plan,
    pub steps: Vec<Step>,
    pub total_steps: usize,
    pub planned: usize,
    pub approved: usize,
    pub rejected: usize,
    pub action_requested: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PlanWithSteps {
    pub fn new(plan: Plan, steps: Vec<Step>) -> Self {
        let mut this = Self {
            plan,
            steps,
            total_steps: 0,
            planned: 0,
            approved: 0,
            rejected: 0,
            action_requested: 0,
            completed: 0,
            failed: 0,
        };
        this.update_step_counts();
        this
    }

    pub fn update_step_counts(&mut self) {
        self.total_steps = self.steps.len();
        self.planned = self.count(StepStatus::Planned);
        self.approved = self.count(StepStatus::Approved);
        self.rejected = self.count(StepStatus::Rejected);
        self.action_requested = self.count(StepStatus::ActionRequested);
        self.completed = self.count(StepStatus::Completed);
        self.failed = self.count(StepStatus::Failed);
    }

    fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}
