//! Tool domain entities

use crate::agent::agent_type::AgentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    /// JSON schema type (`string`, `integer`, `number`, `boolean`)
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".to_string(),
            description: description.into(),
            required: true,
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A simulated business function an agent can call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub agent: AgentType,
    pub parameters: Vec<ToolParameter>,
    /// Result text with `{parameter}` placeholders.
    #[serde(default)]
    pub response_template: Option<String>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: AgentType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
            parameters: Vec::new(),
            response_template: None,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.response_template = Some(template.into());
        self
    }

    /// Function schema in the chat-completions `tools` format.
    pub fn to_openai_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.parameters {
            properties.insert(
                p.name.clone(),
                json!({ "type": p.param_type, "description": p.description }),
            );
            if p.required {
                required.push(Value::String(p.name.clone()));
            }
        }
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }

    /// Produce the simulated result of calling this tool.
    pub fn render(&self, args: &Value) -> String {
        match &self.response_template {
            Some(template) => {
                let mut out = template.clone();
                for p in &self.parameters {
                    let value = args.get(&p.name).map(value_text).unwrap_or_default();
                    out = out.replace(&format!("{{{}}}", p.name), &value);
                }
                out
            }
            None => {
                let mut out = format!("##### {}\n", title_case(&self.name));
                for p in &self.parameters {
                    if let Some(value) = args.get(&p.name) {
                        out.push_str(&format!("**{}:** {}\n", title_case(&p.name), value_text(value)));
                    }
                }
                out.push_str(&format!("\n{} completed.", title_case(&self.name)));
                out
            }
        }
    }

    pub fn summary(&self) -> ToolSummary {
        let arguments = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.param_type))
            .collect::<Vec<_>>()
            .join(", ");
        ToolSummary {
            agent: self.agent,
            function: self.name.clone(),
            description: self.description.clone(),
            arguments,
        }
    }
}

/// A tool as listed by the agent-tools endpoint and the planner prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub agent: AgentType,
    pub function: String,
    pub description: String,
    pub arguments: String,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Decoded JSON arguments (`{}` when the model sent none).
    pub arguments: Value,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentor_tool() -> ToolDefinition {
        ToolDefinition::new("assign_mentor", "Assign a mentor", AgentType::Hr)
            .with_parameter(ToolParameter::new("employee_name", "Employee"))
            .with_parameter(ToolParameter::new("mentor_name", "Mentor").optional())
    }

    #[test]
    fn test_openai_schema() {
        let schema = mentor_tool().to_openai_schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "assign_mentor");
        assert_eq!(
            schema["function"]["parameters"]["properties"]["employee_name"]["type"],
            "string"
        );
        assert_eq!(schema["function"]["parameters"]["required"], json!(["employee_name"]));
    }

    #[test]
    fn test_render_with_template() {
        let tool = mentor_tool().with_template("Mentor {mentor_name} assigned to {employee_name}.");
        let out = tool.render(&json!({"employee_name": "Jessica", "mentor_name": "Bob"}));
        assert_eq!(out, "Mentor Bob assigned to Jessica.");
    }

    #[test]
    fn test_render_generic() {
        let out = mentor_tool().render(&json!({"employee_name": "Jessica"}));
        assert!(out.starts_with("##### Assign Mentor\n"));
        assert!(out.contains("**Employee Name:** Jessica"));
        assert!(!out.contains("Mentor Name"));
    }

    #[test]
    fn test_summary() {
        let summary = mentor_tool().summary();
        assert_eq!(summary.function, "assign_mentor");
        assert_eq!(summary.arguments, "employee_name: string, mentor_name: string");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["agent"], "Hr_Agent");
    }
}
