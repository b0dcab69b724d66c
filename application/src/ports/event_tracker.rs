//! Port for structured business-event tracking.
//!
//! Defines the [`EventTracker`] trait for recording workflow events (step
//! updates, plan creation, feedback received) to a telemetry sink.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! workflow's audit trail in a machine-readable format (JSONL).

use serde_json::Value;
use tracing::warn;

/// A tracked workflow event.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    /// Human-readable event name.
    pub name: String,
    /// JSON payload with event-specific data.
    pub properties: Value,
}

impl TrackedEvent {
    pub fn new(name: impl Into<String>, properties: Value) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

/// Port for recording workflow events.
///
/// `track` is synchronous and non-fallible so telemetry failures never
/// disrupt the workflow; adapters log and drop their own errors.
pub trait EventTracker: Send + Sync {
    fn track(&self, event: TrackedEvent);

    /// Whether a sink is configured. Unconfigured trackers skip events.
    fn is_configured(&self) -> bool {
        true
    }
}

/// No-op implementation for tests and when telemetry is disabled.
pub struct NoEventTracker;

impl EventTracker for NoEventTracker {
    fn track(&self, _event: TrackedEvent) {}

    fn is_configured(&self) -> bool {
        false
    }
}

/// Record an event, or log that it was skipped when no sink is configured.
pub fn track_event_if_configured(tracker: &dyn EventTracker, name: &str, properties: Value) {
    if !tracker.is_configured() {
        warn!("Skipping track_event for {name} as telemetry is not configured");
        return;
    }
    tracker.track(TrackedEvent::new(name, properties));
}
