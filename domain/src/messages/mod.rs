//! Messages between the API, the coordinator and agents, and the chat
//! records persisted for each session.

pub mod chat;
pub mod requests;
