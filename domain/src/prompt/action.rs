//! Action request prompt with the plan's conversation history

use crate::plan::entities::Step;

/// Builds the action text sent to the agent that owns a step.
pub struct ActionPrompt;

impl ActionPrompt {
    /// Prefix the step's action with the replies of the steps before it.
    ///
    /// `steps` is the plan's full step list in order; history stops at the
    /// step being actioned.
    pub fn with_history(plan_summary: &str, steps: &[Step], current: &Step) -> String {
        let mut history = String::new();
        for (i, step) in steps.iter().enumerate() {
            if step.id == current.id {
                break;
            }
            history.push_str(&format!(
                "Step {}\nGroup_Chat_Manager: {}\n{}: {}\n",
                i,
                step.effective_action(),
                step.agent,
                step.agent_reply.as_deref().unwrap_or_default()
            ));
        }

        format!(
            "<conversation_history>Here is the conversation history so far for the current plan. \
             This information may or may not be relevant to the step you have been asked to execute.\
             The user's task was:\n{plan_summary}\n\n\
             The conversation between the previous agents so far is below:\n{history}\
             <conversation_history \\>. Here is the step to action: {action}. \
             ONLY perform the steps and actions required to complete this specific step, \
             the other steps have already been completed. Only use the conversational history \
             for additional information, if it's required to complete the step you have been assigned.",
            action = current.effective_action()
        )
    }
}
