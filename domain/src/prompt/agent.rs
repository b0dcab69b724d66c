//! Default system messages for the domain agents

use crate::agent::agent_type::AgentType;

pub struct AgentPrompt;

impl AgentPrompt {
    pub fn system(agent: AgentType) -> String {
        let role = match agent {
            AgentType::Hr => {
                "an AI Agent. You have knowledge about HR (e.g., human resources), policies, \
                 procedures, and onboarding guidelines."
            }
            AgentType::Marketing => {
                "a Marketing agent. You have knowledge about marketing, including campaigns, \
                 market research, and promotional activities."
            }
            AgentType::Procurement => {
                "a Procurement agent. You specialize in purchasing, vendor management, \
                 and supply chain operations."
            }
            AgentType::Product => {
                "a Product agent. You have knowledge about product management, development, \
                 and compliance guidelines."
            }
            AgentType::TechSupport => {
                "a Tech Support agent. You help with technical issues, IT support, \
                 and account setup."
            }
            AgentType::Knowledge => {
                "a Knowledge agent. You answer questions from the knowledge base. Use \
                 search_knowledge_base to find relevant information and cite what you found."
            }
            AgentType::Human => "the human in the loop. You confirm and complete steps yourself.",
            AgentType::Planner => "the Planner agent.",
            AgentType::GroupChatManager => "the Group Chat Manager.",
            AgentType::Generic => "a Generic agent. You complete general requests.",
        };
        format!(
            "You are {role} You have access to a set of functions. Use them when they help \
             complete the step you were given, and reply with a concise summary of what was done."
        )
    }
}
