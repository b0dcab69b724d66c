//! The agents that participate in a session.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifies an agent. The serialized form is the wire name used in stored
/// documents, planner output and HTTP payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgentType {
    #[serde(rename = "Human_Agent")]
    Human,
    #[serde(rename = "Hr_Agent")]
    Hr,
    #[serde(rename = "Marketing_Agent")]
    Marketing,
    #[serde(rename = "Procurement_Agent")]
    Procurement,
    #[serde(rename = "Product_Agent")]
    Product,
    #[default]
    #[serde(rename = "Generic_Agent")]
    Generic,
    #[serde(rename = "Tech_Support_Agent")]
    TechSupport,
    #[serde(rename = "Knowledge_Agent")]
    Knowledge,
    #[serde(rename = "Group_Chat_Manager")]
    GroupChatManager,
    #[serde(rename = "Planner_Agent")]
    Planner,
}

impl AgentType {
    pub const ALL: [AgentType; 10] = [
        AgentType::Human,
        AgentType::Hr,
        AgentType::Marketing,
        AgentType::Procurement,
        AgentType::Product,
        AgentType::Generic,
        AgentType::TechSupport,
        AgentType::Knowledge,
        AgentType::GroupChatManager,
        AgentType::Planner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Human => "Human_Agent",
            AgentType::Hr => "Hr_Agent",
            AgentType::Marketing => "Marketing_Agent",
            AgentType::Procurement => "Procurement_Agent",
            AgentType::Product => "Product_Agent",
            AgentType::Generic => "Generic_Agent",
            AgentType::TechSupport => "Tech_Support_Agent",
            AgentType::Knowledge => "Knowledge_Agent",
            AgentType::GroupChatManager => "Group_Chat_Manager",
            AgentType::Planner => "Planner_Agent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Human => "Human",
            AgentType::Hr => "HR",
            AgentType::Marketing => "Marketing",
            AgentType::Procurement => "Procurement",
            AgentType::Product => "Product",
            AgentType::Generic => "Generic",
            AgentType::TechSupport => "Tech Support",
            AgentType::Knowledge => "Knowledge",
            AgentType::GroupChatManager => "Group Chat Manager",
            AgentType::Planner => "Planner",
        }
    }

    /// Agents the planner may assign steps to.
    pub fn domain_agents() -> Vec<AgentType> {
        Self::ALL
            .into_iter()
            .filter(|a| !matches!(a, AgentType::Planner | AgentType::GroupChatManager))
            .collect()
    }

    /// Agents that execute steps through an LLM and tools.
    pub fn is_domain_agent(&self) -> bool {
        !matches!(
            self,
            AgentType::Human | AgentType::Planner | AgentType::GroupChatManager
        )
    }

    pub fn is_human(&self) -> bool {
        matches!(self, AgentType::Human)
    }

    /// Prefix of the tool catalog file for this agent (`hr` → `hr_tools.json`).
    pub fn tool_file_stem(&self) -> &'static str {
        match self {
            AgentType::Human => "human",
            AgentType::Hr => "hr",
            AgentType::Marketing => "marketing",
            AgentType::Procurement => "procurement",
            AgentType::Product => "product",
            AgentType::Generic => "generic",
            AgentType::TechSupport => "tech_support",
            AgentType::Knowledge => "knowledge",
            AgentType::GroupChatManager => "group_chat_manager",
            AgentType::Planner => "planner",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = DomainError;

    /// Accepts the wire name in any case, with or without the `_agent`
    /// suffix (`Hr_Agent`, `hr`, `TECH_SUPPORT`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let stem = normalized.strip_suffix("_agent").unwrap_or(&normalized);
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(&normalized) || a.tool_file_stem() == stem)
            .ok_or_else(|| DomainError::InvalidAgent(s.to_string()))
    }
}
