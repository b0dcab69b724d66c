//! Event tracking infrastructure.
//!
//! Provides [`JsonlEventTracker`], an append-only JSONL writer that
//! implements the [`EventTracker`](agentflow_application::EventTracker) port.

mod jsonl_event_tracker;

pub use jsonl_event_tracker::JsonlEventTracker;
