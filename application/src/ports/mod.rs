//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod content_safety;
pub mod event_tracker;
pub mod llm_gateway;
pub mod memory_store;
