//! Parsing the planner's structured output.
//!
//! The planner is asked for a JSON document:
//!
//! ```json
//! {
//!   "initial_goal": "string",
//!   "steps": [ { "action": "string", "agent": "Hr_Agent" } ],
//!   "summary_plan_and_steps": "string",
//!   "human_clarification_request": "string or null"
//! }
//! ```
//!
//! Models do not always return bare JSON, so the parser also accepts a
//! fenced ` ```json ` block or a JSON object embedded in prose.

use super::entities::{Plan, Step};
use super::value_objects::{SessionId, UserId};
use crate::agent::agent_type::AgentType;
use crate::core::error::DomainError;
use serde_json::Value;

/// One step as proposed by the planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub action: String,
    pub agent: AgentType,
    /// The agent name the planner used when it was not recognised and the
    /// step fell back to [`AgentType::Generic`].
    pub unknown_agent: Option<String>,
}

/// The planner's output, validated
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPlan {
    pub initial_goal: String,
    pub steps: Vec<PlannedStep>,
    pub summary_plan_and_steps: String,
    pub human_clarification_request: Option<String>,
}

impl StructuredPlan {
    /// Build the plan and step entities for a session.
    ///
    /// `task` is used as the goal when the planner left `initial_goal` empty.
    pub fn into_entities(
        self,
        session_id: &SessionId,
        user_id: &UserId,
        task: &str,
    ) -> (Plan, Vec<Step>) {
        let goal = if self.initial_goal.trim().is_empty() {
            task.to_string()
        } else {
            self.initial_goal
        };
        let mut plan = Plan::new(session_id.clone(), user_id.clone(), goal)
            .with_summary(self.summary_plan_and_steps);
        plan.human_clarification_request = self.human_clarification_request;

        let steps = self
            .steps
            .into_iter()
            .map(|s| Step::new(&plan, s.action, s.agent))
            .collect();
        (plan, steps)
    }
}

/// Parse planner response text into a [`StructuredPlan`].
pub fn parse_planner_response(response: &str) -> Result<StructuredPlan, DomainError> {
    let json = extract_json(response)
        .ok_or_else(|| DomainError::InvalidPlan("response contains no JSON object".into()))?;
    parse_planner_json(&json)
}

/// Parse an already-decoded planner JSON document.
pub fn parse_planner_json(json: &Value) -> Result<StructuredPlan, DomainError> {
    let initial_goal = string_field(json, "initial_goal").unwrap_or_default();
    let summary = string_field(json, "summary_plan_and_steps").unwrap_or_default();
    let clarification =
        string_field(json, "human_clarification_request").filter(|s| !s.trim().is_empty());

    let raw_steps = json
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::InvalidPlan("missing steps".into()))?;

    let mut steps = Vec::with_capacity(raw_steps.len());
    for raw in raw_steps {
        let Some(action) = string_field(raw, "action").filter(|a| !a.trim().is_empty()) else {
            continue;
        };
        let agent_name = string_field(raw, "agent").unwrap_or_default();
        let (agent, unknown_agent) = match agent_name.parse::<AgentType>() {
            Ok(agent) if agent != AgentType::Planner && agent != AgentType::GroupChatManager => {
                (agent, None)
            }
            _ => (AgentType::Generic, Some(agent_name)),
        };
        steps.push(PlannedStep {
            action,
            agent,
            unknown_agent,
        });
    }

    if steps.is_empty() {
        return Err(DomainError::InvalidPlan("No steps found".into()));
    }

    Ok(StructuredPlan {
        initial_goal,
        steps,
        summary_plan_and_steps: summary,
        human_clarification_request: clarification,
    })
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Find the first JSON object in the text.
fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && value.is_object()
    {
        return Some(value);
    }

    // ```json ... ``` or bare ``` ... ```
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let t = line.trim();
        if !in_block && (t == "```json" || t == "```") {
            in_block = true;
            block.clear();
        } else if in_block && t == "```" {
            in_block = false;
            if let Ok(value) = serde_json::from_str::<Value>(&block)
                && value.is_object()
            {
                return Some(value);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&response[start..=end])
        .ok()
        .filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_JSON: &str = r#"{
        "initial_goal": "Onboard Jessica Smith",
        "steps": [
            {"action": "Create an email account", "agent": "Hr_Agent"},
            {"action": "Order a laptop", "agent": "Procurement_Agent"},
            {"action": "Confirm start date", "agent": "Human_Agent"}
        ],
        "summary_plan_and_steps": "Onboard the employee in three steps",
        "human_clarification_request": "What is the start date?"
    }"#;

    #[test]
    fn test_parse_raw_json() {
        let plan = parse_planner_response(PLAN_JSON).unwrap();
        assert_eq!(plan.initial_goal, "Onboard Jessica Smith");
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[0].agent, AgentType::Hr);
        assert_eq!(plan.steps[1].agent, AgentType::Procurement);
        assert_eq!(plan.steps[2].agent, AgentType::Human);
        assert_eq!(
            plan.human_clarification_request.as_deref(),
            Some("What is the start date?")
        );
    }

    #[test]
    fn test_parse_fenced_block() {
        let response = format!("Here is the plan:\n```json\n{PLAN_JSON}\n```\nLet me know.");
        let plan = parse_planner_response(&response).unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.summary_plan_and_steps, "Onboard the employee in three steps");
    }

    #[test]
    fn test_parse_embedded_object() {
        let response = format!("Sure! {} Hope this helps.", PLAN_JSON.replace('\n', " "));
        let plan = parse_planner_response(&response).unwrap();
        assert_eq!(plan.steps.len(), 3);
    }

    #[test]
    fn test_knowledge_agent_step_is_routed_to_knowledge() {
        let json = r#"{"initial_goal": "g", "steps": [{"action": "Search docs", "agent": "Knowledge_Agent"}], "summary_plan_and_steps": "s"}"#;
        let plan = parse_planner_response(json).unwrap();
        assert_eq!(plan.steps[0].agent, AgentType::Knowledge);
        assert!(plan.steps[0].unknown_agent.is_none());
    }

    #[test]
    fn test_unknown_agent_falls_back_to_generic() {
        let json = r#"{"initial_goal": "g", "steps": [{"action": "Review contract", "agent": "Legal_Agent"}], "summary_plan_and_steps": "s"}"#;
        let plan = parse_planner_response(json).unwrap();
        assert_eq!(plan.steps[0].agent, AgentType::Generic);
        assert_eq!(plan.steps[0].unknown_agent.as_deref(), Some("Legal_Agent"));
    }

    #[test]
    fn test_planner_cannot_assign_itself() {
        let json = r#"{"initial_goal": "g", "steps": [{"action": "Plan more", "agent": "Planner_Agent"}]}"#;
        let plan = parse_planner_response(json).unwrap();
        assert_eq!(plan.steps[0].agent, AgentType::Generic);
    }

    #[test]
    fn test_empty_steps_is_error() {
        let json = r#"{"initial_goal": "g", "steps": [], "summary_plan_and_steps": "s"}"#;
        let err = parse_planner_response(json).unwrap_err();
        assert_eq!(err, DomainError::InvalidPlan("No steps found".into()));
    }

    #[test]
    fn test_steps_without_action_are_skipped() {
        let json = r#"{"initial_goal": "g", "steps": [{"agent": "Hr_Agent"}, {"action": "  "}]}"#;
        assert!(parse_planner_response(json).is_err());
    }

    #[test]
    fn test_blank_clarification_is_none() {
        let json = r#"{"initial_goal": "g", "steps": [{"action": "a", "agent": "Hr_Agent"}], "human_clarification_request": ""}"#;
        let plan = parse_planner_response(json).unwrap();
        assert!(plan.human_clarification_request.is_none());
    }

    #[test]
    fn test_no_json_is_error() {
        assert!(parse_planner_response("I cannot help with that.").is_err());
    }

    #[test]
    fn test_into_entities() {
        let plan = parse_planner_response(PLAN_JSON).unwrap();
        let session = SessionId::new("s1");
        let user = UserId::new("u1");
        let (plan, steps) = plan.into_entities(&session, &user, "task text");
        assert_eq!(plan.initial_goal, "Onboard Jessica Smith");
        assert_eq!(plan.summary.as_deref(), Some("Onboard the employee in three steps"));
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.plan_id == plan.id && s.session_id == session));
    }

    #[test]
    fn test_into_entities_uses_task_when_goal_missing() {
        let json = r#"{"steps": [{"action": "a", "agent": "Hr_Agent"}]}"#;
        let plan = parse_planner_response(json).unwrap();
        let (plan, _) = plan.into_entities(&SessionId::new("s"), &UserId::new("u"), "the task");
        assert_eq!(plan.initial_goal, "the task");
    }
}
