//! LLM gateway adapters

pub mod openai_gateway;

pub use openai_gateway::OpenAiCompatibleGateway;
