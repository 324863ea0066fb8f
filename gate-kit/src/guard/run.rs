use std::path::PathBuf;

use serde::Serialize;

use super::confirm::Confirmer;
use super::confirm::confirm_if_needed;
use super::engine;
use super::kind::DocumentKind;
use crate::document::load_yaml_or_json;
use crate::error::GateKitError;
use crate::error::Result;
use crate::error::exit_codes;

/// Inputs of one guard invocation.
#[derive(Debug, Clone)]
pub struct GuardRequest {
    pub current: PathBuf,
    /// Defaults to `current`.
    pub proposed: Option<PathBuf>,
    pub apply: bool,
    pub confirm: bool,
    pub fail_on_warning: bool,
}

impl GuardRequest {
    pub fn check(current: impl Into<PathBuf>) -> Self {
        Self {
            current: current.into(),
            proposed: None,
            apply: false,
            confirm: false,
            fail_on_warning: false,
        }
    }

    pub fn proposed_path(&self) -> &PathBuf {
        self.proposed.as_ref().unwrap_or(&self.current)
    }
}

/// What the guard found. Serializes to the `--json` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardReport {
    pub apply: bool,
    pub diffs: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub applied: bool,
}

/// How a guard invocation ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GuardOutcome {
    /// Validated without `--apply`.
    Checked,
    Applied,
    /// Schema errors; nothing else was evaluated.
    Invalid,
    /// Warnings present under `--fail-on-warning`.
    WarningsRejected,
    /// Confirmation was refused or unavailable.
    Declined,
}

impl GuardOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Checked | Self::Applied => exit_codes::SUCCESS,
            Self::Invalid => exit_codes::FAILURE,
            Self::WarningsRejected => exit_codes::WARNINGS_REJECTED,
            Self::Declined => exit_codes::DECLINED,
        }
    }
}

/// Result of [`run_guard`].
#[derive(Debug, Clone)]
pub struct GuardRun {
    pub report: GuardReport,
    pub outcome: GuardOutcome,
    pub current: PathBuf,
}

/// Validate, warn, diff, confirm and apply a proposed document of kind `K`.
///
/// Schema errors short-circuit before warnings, diffs or apply. The current
/// document is only diffed when it exists.
pub fn run_guard<K: DocumentKind>(
    request: &GuardRequest,
    confirmer: &dyn Confirmer,
) -> Result<GuardRun> {
    let proposed_path = request.proposed_path();
    if !proposed_path.exists() {
        return Err(GateKitError::ConfigNotFound {
            path: proposed_path.clone(),
        });
    }

    let proposed = load_yaml_or_json(proposed_path, &format!("Proposed {}", K::LABEL))?;
    let mut report = GuardReport {
        apply: request.apply,
        ..GuardReport::default()
    };

    let finish = |report: GuardReport, outcome: GuardOutcome| GuardRun {
        report,
        outcome,
        current: request.current.clone(),
    };

    report.errors = engine::validate::<K>(&proposed);
    if !report.errors.is_empty() {
        tracing::warn!(kind = K::NAME, errors = report.errors.len(), "proposed document invalid");
        return Ok(finish(report, GuardOutcome::Invalid));
    }

    report.warnings = engine::warn::<K>(&proposed);
    if request.current.exists() {
        let current = load_yaml_or_json(&request.current, &format!("Current {}", K::LABEL))?;
        report.diffs = engine::diff::<K>(&current, &proposed);
    }

    if !report.warnings.is_empty() && request.fail_on_warning {
        return Ok(finish(report, GuardOutcome::WarningsRejected));
    }

    if !request.apply {
        return Ok(finish(report, GuardOutcome::Checked));
    }

    if !confirm_if_needed(&report.warnings, request.confirm, confirmer) {
        return Ok(finish(report, GuardOutcome::Declined));
    }

    engine::apply(proposed_path, &request.current)?;
    report.applied = true;
    Ok(finish(report, GuardOutcome::Applied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::NonInteractive;
    use crate::guard::PolicyKind;
    use std::fs;
    use tempfile::tempdir;

    const RISKY: &str = "version: 1\npolicy:\n  rigor_level: low\n  autonomy_level: advanced\n  risk_tolerance: low\n  execution_continuity: auto-safe\n  observability_depth: normal\n";

    #[test]
    fn warnings_without_terminal_decline_apply() {
        let dir = tempdir().expect("tempdir");
        let current = dir.path().join("ceres.policy.yaml");
        let proposed = dir.path().join("ceres.policy.proposed.yaml");
        fs::write(&current, "version: 1\n").expect("write current");
        fs::write(&proposed, RISKY).expect("write proposed");

        let request = GuardRequest {
            proposed: Some(proposed),
            apply: true,
            ..GuardRequest::check(&current)
        };
        let run = run_guard::<PolicyKind>(&request, &NonInteractive).expect("guard");

        assert_eq!(run.outcome, GuardOutcome::Declined);
        assert_eq!(run.outcome.exit_code(), 3);
        assert_eq!(fs::read_to_string(&current).expect("read"), "version: 1\n");
    }

    #[test]
    fn fail_on_warning_beats_apply() {
        let dir = tempdir().expect("tempdir");
        let current = dir.path().join("ceres.policy.yaml");
        fs::write(&current, RISKY).expect("write");

        let request = GuardRequest {
            apply: true,
            confirm: true,
            fail_on_warning: true,
            ..GuardRequest::check(&current)
        };
        let run = run_guard::<PolicyKind>(&request, &NonInteractive).expect("guard");
        assert_eq!(run.outcome, GuardOutcome::WarningsRejected);
        assert!(!run.report.applied);
    }

    #[test]
    fn json_payload_has_sorted_keys() {
        let report = GuardReport {
            apply: true,
            errors: vec!["e".into()],
            ..GuardReport::default()
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert_eq!(json, r#"{"apply":true,"diffs":[],"errors":["e"],"warnings":[]}"#);
    }
}
