//! The set of tools available to each agent.

use super::entities::{ToolDefinition, ToolParameter, ToolSummary};
use crate::agent::agent_type::AgentType;

/// Tools grouped by owning agent. Registering a tool with an existing
/// (agent, name) pair replaces it.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDefinition) {
        match self
            .tools
            .iter_mut()
            .find(|t| t.agent == tool.agent && t.name == tool.name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn extend(&mut self, tools: impl IntoIterator<Item = ToolDefinition>) {
        for tool in tools {
            self.register(tool);
        }
    }

    pub fn for_agent(&self, agent: AgentType) -> Vec<&ToolDefinition> {
        self.tools.iter().filter(|t| t.agent == agent).collect()
    }

    pub fn find(&self, agent: AgentType, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.agent == agent && t.name == name)
    }

    pub fn summaries(&self) -> Vec<ToolSummary> {
        self.tools.iter().map(ToolDefinition::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// A small default catalog so every domain agent has something to call.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.extend([
            ToolDefinition::new(
                "schedule_orientation_session",
                "Schedule an orientation session for a new employee.",
                AgentType::Hr,
            )
            .with_parameter(ToolParameter::new("employee_name", "Name of the employee"))
            .with_parameter(ToolParameter::new("date", "Date of the session"))
            .with_template("Orientation session for {employee_name} scheduled on {date}."),
            ToolDefinition::new(
                "assign_mentor",
                "Assign a mentor to a new employee.",
                AgentType::Hr,
            )
            .with_parameter(ToolParameter::new("employee_name", "Name of the employee")),
            ToolDefinition::new(
                "order_hardware",
                "Order hardware items for the organization.",
                AgentType::Procurement,
            )
            .with_parameter(ToolParameter::new("item_name", "Item to order"))
            .with_parameter(ToolParameter::new("quantity", "Quantity").with_type("integer")),
            ToolDefinition::new(
                "create_marketing_campaign",
                "Create a new marketing campaign.",
                AgentType::Marketing,
            )
            .with_parameter(ToolParameter::new("campaign_name", "Name of the campaign"))
            .with_parameter(ToolParameter::new("target_audience", "Audience"))
            .with_parameter(ToolParameter::new("budget", "Budget").with_type("number")),
            ToolDefinition::new(
                "add_mobile_extras_pack",
                "Add an extras pack to a customer's mobile plan.",
                AgentType::Product,
            )
            .with_parameter(ToolParameter::new("new_extras_pack_name", "Pack name"))
            .with_parameter(ToolParameter::new("start_date", "Start date")),
            ToolDefinition::new(
                "set_up_office_365_account",
                "Set up an Office 365 account for an employee.",
                AgentType::TechSupport,
            )
            .with_parameter(ToolParameter::new("employee_name", "Name of the employee"))
            .with_parameter(ToolParameter::new("email", "Email address")),
            ToolDefinition::new(
                "search_knowledge_base",
                "Search the knowledge base for the given query.",
                AgentType::Knowledge,
            )
            .with_parameter(ToolParameter::new("query", "The search query text"))
            .with_parameter(
                ToolParameter::new("top", "Maximum number of results to return")
                    .with_type("integer")
                    .optional(),
            ),
            ToolDefinition::new(
                "dummy_function",
                "A generic placeholder action.",
                AgentType::Generic,
            )
            .with_template("This is a placeholder function."),
        ]);
        catalog
    }
}
