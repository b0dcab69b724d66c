//! Planner prompts

use crate::agent::agent_type::AgentType;
use crate::tool::entities::ToolSummary;

/// Templates for the planner agent
pub struct PlannerPrompt;

impl PlannerPrompt {
    pub fn system() -> &'static str {
        "You are a Planner agent. You break a user's goal into a short sequence of steps and \
         assign each step to the single agent best suited to perform it. You only respond with \
         the requested JSON document."
    }

    /// Instruction sent with the user's objective.
    ///
    /// Lists every agent the planner may assign and every tool those agents
    /// can call, then describes the expected JSON document.
    pub fn instruction(objective: &str, agents: &[AgentType], tools: &[ToolSummary]) -> String {
        let agent_list = agents
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let tool_list = tools
            .iter()
            .map(|t| format!("{}: {} ({}) - {}", t.agent, t.function, t.arguments, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are the Planner, an AI orchestrator that manages a group of AI agents to accomplish tasks.

For the given objective, come up with a simple step-by-step plan.
This plan should involve individual tasks that, if executed correctly, will yield the correct answer. Do not add any superfluous steps.
The result of the final step should be the final answer. Make sure that each step has all the information needed - do not skip steps.

These actions are passed to the specific agent. Make sure the action contains all the information required for the agent to execute the task.

Your objective is:
{objective}

The agents you have access to are:
{agent_list}

These agents have access to the following functions:
{tool_list}

The first step of your plan should be to ask the user for any additional information required to progress the rest of steps planned.

Only use the functions provided as part of your plan. If the task is not possible with the agents and tools provided, create a step with the agent of type Human_Agent to mark the task as incomplete.

Do not add a step for the planner or the group chat manager.

If there is a single function call that can directly solve the task, only generate a plan with a single step.

Choose from {agent_list} ONLY for planning your steps.

When generating the action in the plan, frame the action as an instruction you are passing to the agent to execute. It should be a short, single sentence.

Respond with a single JSON object and nothing else:
{{
  "initial_goal": "the objective restated",
  "steps": [{{"action": "instruction for the agent", "agent": "one of the agent names above"}}],
  "summary_plan_and_steps": "a short summary of the plan",
  "human_clarification_request": "a question for the user, or null if none is needed"
}}"#
        )
    }

    /// Acknowledgement recorded after the human answers a clarification.
    pub fn clarification_acknowledgement() -> &'static str {
        "Thanks. The plan has been updated."
    }
}
