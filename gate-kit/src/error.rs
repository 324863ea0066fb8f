//! Error types for gate-kit operations
//!
//! Every variant is terminal for the current invocation: nothing is retried
//! or recovered automatically. The remedy is always an operator correcting
//! the input artifact and re-invoking.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Gate-kit result type alias
pub type Result<T> = std::result::Result<T, GateKitError>;

/// Process exit codes shared by the gate and guard tools.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    /// Validation or business-rule failure.
    pub const FAILURE: i32 = 1;
    /// Warnings treated as failure (`--fail-on-warning`).
    pub const WARNINGS_REJECTED: i32 = 2;
    /// Operator declined the confirmation prompt.
    pub const DECLINED: i32 = 3;
    /// A required external command is missing.
    pub const TOOL_MISSING: i32 = 127;
}

/// Gate-kit error taxonomy
#[derive(Debug, Error)]
pub enum GateKitError {
    #[error("Missing configuration: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse {label} ({}): {reason}", path.display())]
    Parse {
        label: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Schema validation failed: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    #[error("Mode enforcement failed: {message}")]
    IllegalCombination { mode: String, message: String },

    #[error("Auto-safe blocked: {}", reasons.join("; "))]
    AutoSafeBlocked { reasons: Vec<String> },

    #[error("Active profile '{name}' not found in configuration.")]
    ProfileNotFound { name: String },

    #[error("Stage {stage} failed: {reason}")]
    StageFailure {
        stage: String,
        reason: String,
        details: serde_json::Value,
        exit_code: i32,
    },

    #[error("{program}: command not found")]
    ExternalToolMissing { program: String },

    #[error("{program} exited with {}", describe_exit(*exit_code))]
    ExternalToolFailed {
        program: String,
        exit_code: Option<i32>,
    },

    #[error("{}", describe_ambiguity(label, location, candidates))]
    AmbiguousArtifact {
        label: String,
        location: PathBuf,
        candidates: Vec<String>,
    },

    #[error("Workspace not found: {}", path.display())]
    WorkspaceMissing { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GateKitError {
    /// Build an I/O error bound to the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GateKitError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateKitError::ExternalToolMissing { .. } => exit_codes::TOOL_MISSING,
            GateKitError::StageFailure { exit_code, .. } => *exit_code,
            _ => exit_codes::FAILURE,
        }
    }

    /// Structured details for audit events.
    pub fn details(&self) -> serde_json::Value {
        match self {
            GateKitError::ConfigNotFound { path } | GateKitError::WorkspaceMissing { path } => {
                serde_json::json!({ "path": path })
            }
            GateKitError::Parse { label, path, reason } => {
                serde_json::json!({ "label": label, "path": path, "error": reason })
            }
            GateKitError::SchemaValidation(errors) => serde_json::json!({ "errors": errors }),
            GateKitError::AutoSafeBlocked { reasons } => serde_json::json!({ "reasons": reasons }),
            GateKitError::ExternalToolMissing { program } => {
                serde_json::json!({ "program": program })
            }
            GateKitError::ExternalToolFailed { program, exit_code } => {
                serde_json::json!({ "program": program, "exit_code": exit_code })
            }
            GateKitError::AmbiguousArtifact {
                location,
                candidates,
                ..
            } => serde_json::json!({ "location": location, "candidates": candidates }),
            GateKitError::StageFailure { details, .. } => details.clone(),
            GateKitError::Io { path, source } => {
                serde_json::json!({ "path": path, "error": source.to_string() })
            }
            _ => serde_json::Value::Null,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn describe_ambiguity(label: &str, location: &std::path::Path, candidates: &[String]) -> String {
    if candidates.is_empty() {
        format!("{label} not found in {}", location.display())
    } else {
        format!(
            "Multiple {label} candidates found in {}. Provide a single file. Found: {}",
            location.display(),
            candidates.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_missing_maps_to_127() {
        let err = GateKitError::ExternalToolMissing {
            program: "prompt-debugger/cli.py".into(),
        };
        assert_eq!(err.exit_code(), exit_codes::TOOL_MISSING);
        assert_eq!(err.to_string(), "prompt-debugger/cli.py: command not found");
    }

    #[test]
    fn stage_failure_keeps_its_exit_code() {
        let err = GateKitError::StageFailure {
            stage: "gap_ledger".into(),
            reason: "Blocking gaps unresolved: GAP-1".into(),
            details: serde_json::json!({ "gap_ids": ["GAP-1"] }),
            exit_code: exit_codes::FAILURE,
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.details()["gap_ids"][0], "GAP-1");
    }

    #[test]
    fn ambiguity_message_distinguishes_absence_from_multiplicity() {
        let absent = GateKitError::AmbiguousArtifact {
            label: "Spec Elicitation Record".into(),
            location: PathBuf::from("specs/elicitation"),
            candidates: vec![],
        };
        assert!(absent.to_string().contains("not found"));

        let many = GateKitError::AmbiguousArtifact {
            label: "Spec Elicitation Record".into(),
            location: PathBuf::from("specs/elicitation"),
            candidates: vec!["a.md".into(), "b.md".into()],
        };
        assert!(many.to_string().contains("Found: a.md, b.md"));
    }

    #[test]
    fn auto_safe_lists_every_reason() {
        let err = GateKitError::AutoSafeBlocked {
            reasons: vec!["blocking gaps unresolved".into(), "open ClarificationRequest".into()],
        };
        assert_eq!(
            err.to_string(),
            "Auto-safe blocked: blocking gaps unresolved; open ClarificationRequest"
        );
    }
}
