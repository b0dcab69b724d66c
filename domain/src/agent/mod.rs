//! Agent identity.

pub mod agent_type;
