//! Append-only JSONL audit log
//!
//! Each append opens the file in append mode, writes one compact JSON record
//! terminated by `\n` in a single write, and closes it again. There is no
//! locking: concurrent writers rely on the OS appending whole lines.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::GateKitError;
use crate::error::Result;
use crate::types::EventStatus;
use crate::types::GateContext;

/// Second-precision UTC timestamp, e.g. `2026-01-31T09:15:00Z`.
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Handle to a JSONL event log file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Never rewrites or truncates existing lines.
    pub fn append<T: Serialize>(&self, event: &T) -> Result<()> {
        let mut line = serde_json::to_string(event)
            .map_err(|e| GateKitError::io(&self.path, std::io::Error::from(e)))?;
        line.push('\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| GateKitError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GateKitError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| GateKitError::io(&self.path, e))?;

        tracing::trace!(path = %self.path.display(), "appended event");
        Ok(())
    }
}

/// Parse every line of an event log back into JSON values.
///
/// Diagnostic helper; the gate never reads its own log.
pub fn read_events(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path).map_err(|e| GateKitError::io(path, e))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| GateKitError::Parse {
                label: "event log".to_string(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })
        .collect()
}

// === Event shapes ===

/// One record per executed gate stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvent {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub status: EventStatus,
    pub message: String,
    pub stage: String,
    pub phase: String,
    pub agent: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl GateEvent {
    pub fn new(
        ctx: &GateContext,
        stage: &str,
        status: EventStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: utc_timestamp(),
            event_type: "gate".to_string(),
            status,
            message: message.into(),
            stage: stage.to_string(),
            phase: ctx.phase.clone(),
            agent: ctx.agent.clone(),
            pattern: ctx.pattern.clone(),
            task_id: ctx.task_id.clone(),
            spec_id: ctx.spec_id.clone(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        if !context.is_null() {
            self.context = Some(context);
        }
        self
    }
}

/// Snapshot written on every settings resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionEvent {
    pub event: String,
    pub timestamp: String,
    pub source: String,
    pub active_mode: String,
    pub active_profile: Option<String>,
    pub effective_settings: Value,
    pub run_id: String,
}

impl ResolutionEvent {
    pub fn new(
        active_mode: &str,
        active_profile: Option<&str>,
        effective_settings: Value,
        source: &str,
    ) -> Self {
        Self {
            event: "mode_profile_resolved".to_string(),
            timestamp: utc_timestamp(),
            source: source.to_string(),
            active_mode: active_mode.to_string(),
            active_profile: active_profile.map(str::to_string),
            effective_settings,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Generic operator event (`log-event`, auto-governance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub status: EventStatus,
    pub message: String,
    #[serde(default)]
    pub context: Value,
}

impl AuditEvent {
    pub fn new(event_type: impl Into<String>, status: EventStatus, message: impl Into<String>) -> Self {
        Self {
            timestamp: utc_timestamp(),
            event_type: event_type.into(),
            status,
            message: message.into(),
            context: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateMode;
    use tempfile::tempdir;

    #[test]
    fn timestamp_has_second_precision() {
        let ts = utc_timestamp();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn append_creates_parents_and_appends_lines() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::new(dir.path().join("logs/nested/events.jsonl"));

        log.append(&AuditEvent::new("note", EventStatus::Info, "first"))
            .expect("first append");
        log.append(&AuditEvent::new("note", EventStatus::Warn, "second"))
            .expect("second append");

        let raw = fs::read_to_string(log.path()).expect("read log");
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));

        let events = read_events(log.path()).expect("parse log");
        assert_eq!(events[0]["message"], "first");
        assert_eq!(events[1]["status"], "warn");
    }

    #[test]
    fn gate_event_carries_context_fields() {
        let mut ctx = GateContext::new(GateMode::Plan, "operator", "preflight");
        ctx.spec_id = Some("SPEC-7".to_string());
        let event = GateEvent::new(&ctx, "elicitation", EventStatus::Pass, "ok");
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["type"], "gate");
        assert_eq!(value["phase"], "plan");
        assert_eq!(value["spec_id"], "SPEC-7");
        assert!(value.get("task_id").is_none());
        assert!(value.get("context").is_none());
    }

    #[test]
    fn resolution_events_get_fresh_run_ids() {
        let a = ResolutionEvent::new("guided", None, Value::Null, "test");
        let b = ResolutionEvent::new("guided", None, Value::Null, "test");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.event, "mode_profile_resolved");
    }
}
