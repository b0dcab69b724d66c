//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for agentflow
#[derive(Parser, Debug)]
#[command(name = "agentflow")]
#[command(author, version, about = "Multi-agent planning server with human approval gates")]
#[command(long_about = r#"
agentflow turns a task description into a plan of steps, each owned by a
specialist agent, and runs every step once a human has approved it.

Configuration files are loaded from (in priority order):
1. AGENTFLOW_* environment variables (AGENTFLOW_LLM__MODEL=gpt-4o)
2. --config <path>     Explicit config file
3. ./agentflow.toml    Project-level config
4. ~/.config/agentflow/config.toml   Global config

Example:
  agentflow --bind 0.0.0.0:8000
  agentflow --config deploy.toml -vv
"#)]
pub struct Cli {
    /// Address to listen on (overrides server.bind)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Log filter for the verbosity flag
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
