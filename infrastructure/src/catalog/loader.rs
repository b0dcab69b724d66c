//! Loads agent tool catalogs from a directory of JSON files.
//!
//! Each `<agent>_tools.json` file lists the tools of one agent:
//!
//! ```json
//! {
//!   "tools": [
//!     {
//!       "name": "assign_mentor",
//!       "description": "Assign a mentor to a new employee.",
//!       "parameters": [
//!         { "name": "employee_name", "type": "string", "description": "Employee" }
//!       ],
//!       "response_template": "Mentor assigned to {employee_name}."
//!     }
//!   ]
//! }
//! ```
//!
//! The owning agent comes from the file name (`tech_support_tools.json` is
//! `Tech_Support_Agent`). File tools are merged over the built-in catalog.

use agentflow_domain::{AgentType, ToolCatalog, ToolDefinition, ToolParameter};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

const FILE_SUFFIX: &str = "_tools.json";

#[derive(Error, Debug)]
pub enum ToolFileError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tool file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no agent named '{0}'")]
    UnknownAgent(String),
}

#[derive(Debug, Deserialize)]
struct ToolFile {
    tools: Vec<FileTool>,
}

#[derive(Debug, Deserialize)]
struct FileTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Vec<FileToolParameter>,
    #[serde(default)]
    response_template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileToolParameter {
    name: String,
    #[serde(rename = "type", default = "default_param_type")]
    param_type: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_required")]
    required: bool,
}

fn default_param_type() -> String {
    "string".to_string()
}

fn default_required() -> bool {
    true
}

impl FileTool {
    fn into_definition(self, agent: AgentType) -> ToolDefinition {
        let mut tool = ToolDefinition::new(self.name, self.description, agent);
        for p in self.parameters {
            let mut param = ToolParameter::new(p.name, p.description).with_type(p.param_type);
            if !p.required {
                param = param.optional();
            }
            tool = tool.with_parameter(param);
        }
        if let Some(template) = self.response_template {
            tool = tool.with_template(template);
        }
        tool
    }
}

pub struct ToolCatalogLoader;

impl ToolCatalogLoader {
    /// The built-in catalog, extended with every readable tool file in `dir`.
    ///
    /// A missing directory yields the built-in catalog. Files that cannot be
    /// read or parsed are skipped with a warning.
    pub fn load(dir: Option<&Path>) -> ToolCatalog {
        let mut catalog = ToolCatalog::builtin();
        let Some(dir) = dir else {
            return catalog;
        };

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Tool directory {} not readable: {}", dir.display(), e);
                return catalog;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(FILE_SUFFIX))
            })
            .collect();
        paths.sort();

        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match Self::load_file(&path) {
                Ok(tools) => {
                    debug!("Loaded {} tools from {}", tools.len(), name);
                    catalog.extend(tools);
                }
                Err(err) => warn!("Error loading tool file {name}: {err}"),
            }
        }

        info!("Tool catalog has {} tools", catalog.len());
        catalog
    }

    /// Parse one tool file; the agent is taken from its name.
    pub fn load_file(path: &Path) -> Result<Vec<ToolDefinition>, ToolFileError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let stem = file_name.strip_suffix(FILE_SUFFIX).unwrap_or(file_name);
        let agent = Self::agent_for_stem(stem)
            .ok_or_else(|| ToolFileError::UnknownAgent(stem.to_string()))?;

        let content = std::fs::read_to_string(path)?;
        let file: ToolFile = serde_json::from_str(&content)?;
        Ok(file
            .tools
            .into_iter()
            .map(|t| t.into_definition(agent))
            .collect())
    }

    fn agent_for_stem(stem: &str) -> Option<AgentType> {
        AgentType::ALL
            .into_iter()
            .filter(AgentType::is_domain_agent)
            .find(|a| a.tool_file_stem() == stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_dir_yields_builtin() {
        let builtin = ToolCatalog::builtin().len();
        assert_eq!(ToolCatalogLoader::load(None).len(), builtin);
        assert_eq!(
            ToolCatalogLoader::load(Some(Path::new("/definitely/not/here"))).len(),
            builtin
        );
    }

    #[test]
    fn test_loads_tools_for_agent_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "tech_support_tools.json",
            r#"{"tools": [{
                "name": "reset_password",
                "description": "Reset a password.",
                "parameters": [{"name": "employee_name", "description": "Employee"}],
                "response_template": "Password for {employee_name} reset."
            }]}"#,
        );

        let catalog = ToolCatalogLoader::load(Some(dir.path()));
        let tool = catalog.find(AgentType::TechSupport, "reset_password").unwrap();
        assert_eq!(tool.parameters[0].param_type, "string");
        assert!(tool.parameters[0].required);
        assert_eq!(
            tool.render(&json!({ "employee_name": "Jessica" })),
            "Password for Jessica reset."
        );
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hr_tools.json", "{ not json");
        write(dir.path(), "wizard_tools.json", r#"{"tools": []}"#);
        write(
            dir.path(),
            "marketing_tools.json",
            r#"{"tools": [{"name": "plan_event"}]}"#,
        );
        write(dir.path(), "notes.txt", "ignored");

        let catalog = ToolCatalogLoader::load(Some(dir.path()));
        assert!(catalog.find(AgentType::Marketing, "plan_event").is_some());
        assert_eq!(catalog.len(), ToolCatalog::builtin().len() + 1);
    }

    #[test]
    fn test_file_overrides_builtin_tool() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "hr_tools.json",
            r#"{"tools": [{"name": "assign_mentor", "response_template": "Custom mentor text."}]}"#,
        );

        let catalog = ToolCatalogLoader::load(Some(dir.path()));
        let tool = catalog.find(AgentType::Hr, "assign_mentor").unwrap();
        assert_eq!(tool.render(&json!({})), "Custom mentor text.");
        assert_eq!(catalog.len(), ToolCatalog::builtin().len());
    }

    #[test]
    fn test_unknown_agent_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizard_tools.json");
        std::fs::write(&path, r#"{"tools": []}"#).unwrap();
        assert!(matches!(
            ToolCatalogLoader::load_file(&path),
            Err(ToolFileError::UnknownAgent(stem)) if stem == "wizard"
        ));
    }
}
