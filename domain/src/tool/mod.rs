//! Tool domain
//!
//! Agents act through tools: simulated business functions described by a
//! [`ToolDefinition`](entities::ToolDefinition) and grouped per agent in a
//! [`ToolCatalog`](catalog::ToolCatalog). Calling a tool renders its result
//! text; there is no real side effect.

pub mod catalog;
pub mod entities;
