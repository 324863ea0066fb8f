//! Auto-governance
//!
//! Read-only health detection over the workspace artifacts, followed by a
//! rewrite of the settings document's session overrides: the strict preset
//! when anything is wrong, the fast preset otherwise.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::document::load_yaml_or_json;
use crate::error::Result;
use crate::events::AuditEvent;
use crate::events::EventLog;
use crate::gate::GateInputs;
use crate::gate::PromptReport;
use crate::gate::artifacts::ElicitationRecord;
use crate::gate::artifacts::GapLedger;
use crate::gate::artifacts::ObjectiveContract;
use crate::settings::SettingsState;
use crate::settings::load_state;
use crate::settings::save_state;
use crate::types::EventStatus;

/// Detected workspace problems. Variant order is alphabetical by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceIssue {
    BlockingGapUnresolved,
    ElicitationBlockingUnknowns,
    ElicitationMissing,
    ElicitationNotReady,
    ElicitationParseError,
    GapLedgerMissing,
    GapLedgerParseError,
    ObjectiveContractMissing,
    ObjectiveContractNotCommitted,
    ObjectiveContractParseError,
    PromptDebuggerNotApproved,
    PromptDebuggerParseError,
}

impl GovernanceIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockingGapUnresolved => "blocking_gap_unresolved",
            Self::ElicitationBlockingUnknowns => "elicitation_blocking_unknowns",
            Self::ElicitationMissing => "elicitation_missing",
            Self::ElicitationNotReady => "elicitation_not_ready",
            Self::ElicitationParseError => "elicitation_parse_error",
            Self::GapLedgerMissing => "gap_ledger_missing",
            Self::GapLedgerParseError => "gap_ledger_parse_error",
            Self::ObjectiveContractMissing => "objective_contract_missing",
            Self::ObjectiveContractNotCommitted => "objective_contract_not_committed",
            Self::ObjectiveContractParseError => "objective_contract_parse_error",
            Self::PromptDebuggerNotApproved => "prompt_debugger_not_approved",
            Self::PromptDebuggerParseError => "prompt_debugger_parse_error",
        }
    }
}

/// Session overrides applied when issues are present.
pub fn strict_preset() -> Map<String, Value> {
    preset(json!({
        "execution_allowed": false,
        "enforcement": "strict",
        "execution_continuity": "manual",
        "prompt_debugger": "blocking",
        "intake_required": "manual",
        "spec_elicitation": "manual",
        "gap_ledger": "manual",
    }))
}

/// Session overrides applied to a healthy workspace.
pub fn fast_preset() -> Map<String, Value> {
    preset(json!({
        "execution_allowed": true,
        "enforcement": "warn",
        "execution_continuity": "auto-safe",
        "prompt_debugger": "non-blocking",
        "intake_required": "auto-generate",
        "spec_elicitation": "auto-generate-skeleton",
        "gap_ledger": "auto-append",
    }))
}

fn preset(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn first_elicitation_record(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let mut records: Vec<PathBuf> = fs::read_dir(path)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    records.sort();
    records.into_iter().next()
}

/// Inspect the artifacts named by `inputs`. Never fails; unreadable
/// artifacts become issues.
pub fn detect_issues(inputs: &GateInputs) -> BTreeSet<GovernanceIssue> {
    let mut issues = BTreeSet::new();

    if !inputs.objective.exists() {
        issues.insert(GovernanceIssue::ObjectiveContractMissing);
    } else {
        match ObjectiveContract::load(&inputs.objective) {
            Ok(objective) if !objective.is_committed() => {
                issues.insert(GovernanceIssue::ObjectiveContractNotCommitted);
            }
            Ok(_) => {}
            Err(_) => {
                issues.insert(GovernanceIssue::ObjectiveContractParseError);
            }
        }
    }

    if !inputs.gap_ledger.exists() {
        issues.insert(GovernanceIssue::GapLedgerMissing);
    } else {
        let ledger = load_yaml_or_json(&inputs.gap_ledger, "Gap Ledger").and_then(|doc| {
            if doc.get("gaps").is_none() {
                Ok(GapLedger { gaps: Vec::new() })
            } else {
                GapLedger::from_value(&doc, &inputs.gap_ledger)
            }
        });
        match ledger {
            Ok(ledger) if !ledger.blocking_unresolved().is_empty() => {
                issues.insert(GovernanceIssue::BlockingGapUnresolved);
            }
            Ok(_) => {}
            Err(_) => {
                issues.insert(GovernanceIssue::GapLedgerParseError);
            }
        }
    }

    match first_elicitation_record(&inputs.elicitation) {
        None => {
            issues.insert(GovernanceIssue::ElicitationMissing);
        }
        Some(path) => match ElicitationRecord::load(&path) {
            Ok(record) => {
                if record.ready_for_planning != Some(true) {
                    issues.insert(GovernanceIssue::ElicitationNotReady);
                }
                if record.blocking_unknowns.is_some_and(|u| !u.is_empty()) {
                    issues.insert(GovernanceIssue::ElicitationBlockingUnknowns);
                }
            }
            Err(_) => {
                issues.insert(GovernanceIssue::ElicitationParseError);
            }
        },
    }

    if inputs.prompt_report.exists() {
        match PromptReport::load(&inputs.prompt_report) {
            Ok(report) if report.status.is_some() && !report.is_approved() => {
                issues.insert(GovernanceIssue::PromptDebuggerNotApproved);
            }
            Ok(_) => {}
            Err(_) => {
                issues.insert(GovernanceIssue::PromptDebuggerParseError);
            }
        }
    }

    issues
}

/// Merge the strict or fast preset into the session overrides.
pub fn apply_overrides(state: &mut SettingsState, strict: bool) {
    let values = if strict { strict_preset() } else { fast_preset() };
    state.session_overrides.extend(values);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoGovernanceReport {
    pub issues: Vec<String>,
    pub strict: bool,
}

/// Detect issues, rewrite the settings document and record the decision.
///
/// A missing settings document is a no-op and returns `None`.
pub fn run_auto_governance(
    settings_path: &Path,
    inputs: &GateInputs,
    events: &EventLog,
) -> Result<Option<AutoGovernanceReport>> {
    if !settings_path.exists() {
        tracing::info!(path = %settings_path.display(), "no settings document; auto-governance skipped");
        return Ok(None);
    }

    let issues: Vec<String> = detect_issues(inputs)
        .iter()
        .map(|issue| issue.as_str().to_string())
        .collect();
    let strict = !issues.is_empty();

    let mut state = load_state(settings_path)?;
    apply_overrides(&mut state, strict);
    save_state(settings_path, &state)?;

    let status = if strict {
        EventStatus::Warn
    } else {
        EventStatus::Info
    };
    events.append(
        &AuditEvent::new("auto_governance", status, "auto governance")
            .with_context(json!({ "issues": issues })),
    )?;

    if strict {
        tracing::warn!(issues = ?issues, "strict governance preset applied");
    } else {
        tracing::info!("fast governance preset applied");
    }
    Ok(Some(AutoGovernanceReport { issues, strict }))
}
