//! JSONL file writer for tracked workflow events.
//!
//! Each [`TrackedEvent`] becomes one JSON line holding its properties plus
//! `type` and `timestamp`. The file is opened in append mode so events
//! survive restarts.

use agentflow_application::{EventTracker, TrackedEvent};
use serde_json::{Value, json};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and on `Drop`.
pub struct JsonlEventTracker {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventTracker {
    /// Open the events file for appending, creating it and its parent
    /// directories if needed. Returns `None` if that fails.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: TrackedEvent) -> Value {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    match event.properties {
        Value::Object(mut map) => {
            map.insert("type".to_string(), Value::String(event.name));
            map.insert("timestamp".to_string(), Value::String(timestamp));
            Value::Object(map)
        }
        other => json!({
            "type": event.name,
            "timestamp": timestamp,
            "data": other,
        }),
    }
}

impl EventTracker for JsonlEventTracker {
    fn track(&self, event: TrackedEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
                warn!("Failed to write event to {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for JsonlEventTracker {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events").join("events.jsonl");
        let tracker = JsonlEventTracker::open(&path).unwrap();

        tracker.track(TrackedEvent::new(
            "Planner - Initial plan and added into the store",
            json!({ "plan_id": "p1", "steps": 3 }),
        ));
        tracker.track(TrackedEvent::new("Input task", json!("raw")));
        drop(tracker);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "Planner - Initial plan and added into the store");
        assert_eq!(lines[0]["steps"], 3);
        assert!(lines[0]["timestamp"].is_string());
        assert_eq!(lines[1]["data"], "raw");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        for name in ["first", "second"] {
            let tracker = JsonlEventTracker::open(&path).unwrap();
            tracker.track(TrackedEvent::new(name, json!({})));
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["type"], "second");
    }

    #[test]
    fn test_open_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();
        assert!(JsonlEventTracker::open(blocker.join("events.jsonl")).is_none());
    }
}
