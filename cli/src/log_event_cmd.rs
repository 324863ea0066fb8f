use std::path::PathBuf;

use anyhow::Context;
use ceres_gate_kit::EventLog;
use ceres_gate_kit::EventStatus;
use ceres_gate_kit::events::AuditEvent;
use clap::Parser;
use serde_json::Value;

use crate::context::CommandContext;

/// Arguments for `ceres log-event`
#[derive(Debug, Parser)]
pub struct LogEventArgs {
    /// Event type (e.g. gate, stage, check)
    #[arg(long = "type", value_name = "TYPE")]
    pub event_type: String,

    /// Status: pass, fail, warn or info
    #[arg(long = "status", value_name = "STATUS")]
    pub status: EventStatus,

    /// Short message
    #[arg(long = "message", value_name = "TEXT")]
    pub message: String,

    /// Optional JSON context
    #[arg(long = "context", value_name = "JSON")]
    pub context: Option<String>,

    /// Output JSONL file (defaults to the workspace event log)
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Append one audit event. `ctx` is only needed when `--out` is absent.
pub fn run_log_event(ctx: Option<&CommandContext>, args: &LogEventArgs) -> anyhow::Result<i32> {
    let mut event = AuditEvent::new(args.event_type.as_str(), args.status, args.message.as_str());
    if let Some(raw) = &args.context {
        let context: Value = serde_json::from_str(raw).context("Failed to parse context JSON")?;
        event = event.with_context(context);
    }

    let log = match (&args.out, ctx) {
        (Some(out), _) => EventLog::new(out),
        (None, Some(ctx)) => ctx.event_log(),
        (None, None) => anyhow::bail!("--out is required without a workspace"),
    };

    log.append(&event)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceres_gate_kit::events::read_events;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn args(out: PathBuf, context: Option<&str>) -> LogEventArgs {
        LogEventArgs {
            event_type: "stage".to_string(),
            status: EventStatus::Pass,
            message: "done".to_string(),
            context: context.map(str::to_string),
            out: Some(out),
        }
    }

    #[test]
    fn appends_event_with_context() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("logs/events.jsonl");
        run_log_event(None, &args(out.clone(), Some(r#"{"task": "T-1"}"#))).expect("log");

        let events = read_events(&out).expect("read");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "stage");
        assert_eq!(events[0]["status"], "pass");
        assert_eq!(events[0]["context"]["task"], "T-1");
    }

    #[test]
    fn invalid_context_writes_nothing() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("events.jsonl");
        let err = run_log_event(None, &args(out.clone(), Some("{not json"))).expect_err("invalid");
        assert!(err.to_string().contains("Failed to parse context JSON"));
        assert!(!out.exists());
    }
}
