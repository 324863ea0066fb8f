//! `ceres` binary integration tests
//!
//! ## Exit Codes
//! - 0: Success
//! - 1: Validation or business-rule failure
//! - 2: Warnings rejected (`--fail-on-warning`)
//! - 3: Confirmation declined
//! - 127: Required external command missing

use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

const SAFE_POLICY: &str = "version: 1\npolicy:\n  rigor_level: standard\n  autonomy_level: constrained\n  risk_tolerance: medium\n  execution_continuity: manual\n  observability_depth: normal\n";

const RISKY_POLICY: &str = "version: 1\npolicy:\n  rigor_level: low\n  autonomy_level: advanced\n  risk_tolerance: low\n  execution_continuity: auto-safe\n  observability_depth: normal\n";

/// `ceres` bound to `workspace`, isolated from the caller's environment.
fn ceres(workspace: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("ceres")?;
    cmd.env_remove("CERES_WORKSPACE");
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(workspace);
    cmd.arg("--workspace").arg(workspace);
    // Piped stdin: never a terminal, so confirmations decline.
    cmd.write_stdin("");
    Ok(cmd)
}

fn read_jsonl(path: &Path) -> Result<Vec<JsonValue>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

fn write_settings(root: &Path, session: &str) -> Result<()> {
    fs::write(
        root.join("modes_settings_profiles.json"),
        format!(
            r#"{{
  "active_mode": "guided",
  "active_profile": "",
  "system_defaults": {{"output_density": "compact", "questioning_policy": "ask"}},
  "mode_defaults": [{{"mode": "guided", "settings": {{"output_density": "normal"}}}}],
  "profiles": [],
  "session_overrides": {session}
}}"#
        ),
    )?;
    Ok(())
}

// ============================================================================
// resolve
// ============================================================================

#[test]
fn resolve_prints_effective_settings_and_logs_event() -> Result<()> {
    let ws = TempDir::new()?;
    write_settings(ws.path(), r#"{"questioning_policy": "silent"}"#)?;

    let output = ceres(ws.path())?.arg("resolve").output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let printed: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(printed["active_mode"], "guided");
    assert_eq!(printed["active_profile"], JsonValue::Null);
    assert_eq!(printed["effective_settings"]["output_density"], "normal");
    assert_eq!(printed["effective_settings"]["questioning_policy"], "silent");

    let events = read_jsonl(&ws.path().join("logs/events.jsonl"))?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "mode_profile_resolved");
    assert_eq!(events[0]["source"], "ceres resolve");
    Ok(())
}

#[test]
fn resolve_blocks_auto_safe_without_preconditions() -> Result<()> {
    let ws = TempDir::new()?;
    write_settings(ws.path(), r#"{"execution_continuity": "auto-safe"}"#)?;

    ceres(ws.path())?
        .args(["resolve", "--blocking-gaps-resolved"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Auto-safe blocked"))
        .stderr(predicate::str::contains("open ClarificationRequest"));

    assert!(!ws.path().join("logs/events.jsonl").exists());

    ceres(ws.path())?
        .args([
            "resolve",
            "--blocking-gaps-resolved",
            "--no-open-clarifications",
            "--deterministic-acceptance",
        ])
        .assert()
        .success();
    Ok(())
}

#[test]
fn missing_settings_document_fails() -> Result<()> {
    let ws = TempDir::new()?;
    ceres(ws.path())?
        .arg("resolve")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing configuration"));
    Ok(())
}

#[test]
fn missing_workspace_fails_closed() -> Result<()> {
    let dir = TempDir::new()?;
    ceres(&dir.path().join("absent"))?
        .current_dir(dir.path())
        .arg("resolve")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Workspace not found"));
    Ok(())
}

// ============================================================================
// policy / workflow guard
// ============================================================================

#[test]
fn invalid_proposal_exits_1_and_leaves_current() -> Result<()> {
    let ws = TempDir::new()?;
    fs::write(ws.path().join("ceres.policy.yaml"), SAFE_POLICY)?;
    fs::write(
        ws.path().join("proposed.yaml"),
        SAFE_POLICY.replace("rigor_level: standard", "rigor_level: extreme"),
    )?;

    ceres(ws.path())?
        .args(["policy", "guard", "--proposed", "proposed.yaml", "--apply", "--confirm"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("policy.rigor_level must be one of"));

    assert_eq!(fs::read_to_string(ws.path().join("ceres.policy.yaml"))?, SAFE_POLICY);
    Ok(())
}

#[test]
fn warnings_rejected_exits_2() -> Result<()> {
    let ws = TempDir::new()?;
    fs::write(ws.path().join("ceres.policy.yaml"), SAFE_POLICY)?;
    fs::write(ws.path().join("proposed.yaml"), RISKY_POLICY)?;

    ceres(ws.path())?
        .args(["policy", "guard", "--proposed", "proposed.yaml", "--fail-on-warning"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Warnings:"))
        .stdout(predicate::str::contains("Proposed changes:"));
    Ok(())
}

#[test]
fn unconfirmed_apply_without_terminal_exits_3() -> Result<()> {
    let ws = TempDir::new()?;
    fs::write(ws.path().join("ceres.policy.yaml"), SAFE_POLICY)?;
    fs::write(ws.path().join("proposed.yaml"), RISKY_POLICY)?;

    ceres(ws.path())?
        .args(["policy", "guard", "--proposed", "proposed.yaml", "--apply"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Change not applied."));

    assert_eq!(fs::read_to_string(ws.path().join("ceres.policy.yaml"))?, SAFE_POLICY);
    Ok(())
}

#[test]
fn confirmed_apply_copies_bytes() -> Result<()> {
    let ws = TempDir::new()?;
    fs::write(ws.path().join("ceres.policy.yaml"), SAFE_POLICY)?;
    let proposed = format!("# reviewed\n{RISKY_POLICY}");
    fs::write(ws.path().join("proposed.yaml"), &proposed)?;

    ceres(ws.path())?
        .args(["policy", "guard", "--proposed", "proposed.yaml", "--apply", "--confirm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied policy to"));

    assert_eq!(fs::read_to_string(ws.path().join("ceres.policy.yaml"))?, proposed);
    Ok(())
}

#[test]
fn json_output_has_sorted_payload() -> Result<()> {
    let ws = TempDir::new()?;
    fs::write(ws.path().join("ceres.policy.yaml"), SAFE_POLICY)?;
    fs::write(ws.path().join("proposed.yaml"), RISKY_POLICY)?;

    let output = ceres(ws.path())?
        .args(["policy", "guard", "--proposed", "proposed.yaml", "--json"])
        .output()?;
    assert!(output.status.success());

    let payload: JsonValue = serde_json::from_slice(&output.stdout)?;
    let keys: Vec<&str> = payload
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(keys, vec!["apply", "diffs", "errors", "warnings"]);
    assert_eq!(payload["apply"], false);
    assert_eq!(payload["errors"], serde_json::json!([]));
    assert_eq!(payload["warnings"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn workflow_edit_seeds_proposed_copy() -> Result<()> {
    let ws = TempDir::new()?;
    let workflow = "version: 1\nworkflow:\n  auto_housekeeping: true\n  auto_push: false\n  announce_push: false\n";
    fs::write(ws.path().join("ceres.workflow.yaml"), workflow)?;

    ceres(ws.path())?
        .args(["workflow", "edit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created proposed workflow config"))
        .stdout(predicate::str::contains(
            "Review proposed workflow config and re-run with --apply to commit changes.",
        ));

    assert_eq!(
        fs::read_to_string(ws.path().join("ceres.workflow.proposed.yaml"))?,
        workflow
    );

    // Second run reuses the existing copy.
    ceres(ws.path())?
        .args(["workflow", "edit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created proposed").not());
    Ok(())
}

// ============================================================================
// preflight
// ============================================================================

#[cfg(unix)]
mod preflight {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Workspace that passes every stage in execute mode, with shell
    /// collaborators wired through `ceres.toml`.
    fn healthy_workspace(lifecycle: &str) -> Result<TempDir> {
        let ws = TempDir::new()?;
        let root = ws.path();
        fs::create_dir_all(root.join("bin"))?;
        fs::write(
            root.join("bin/prompt-debugger.sh"),
            "#!/bin/sh\necho 'status: approved'\necho 'issues: []'\n",
        )?;
        fs::write(
            root.join("ceres.toml"),
            format!(
                "[collaborators]\nprompt_debugger = \"sh bin/prompt-debugger.sh\"\ncontract_validator = \"true\"\nlifecycle_enforcer = \"{lifecycle}\"\n"
            ),
        )?;
        fs::write(root.join("todo-inbox.md"), "Implement the login flow\n")?;
        fs::write(root.join("todo.md"), "- [ ] prompts/login.md\n")?;
        fs::write(root.join("objective-contract.json"), r#"{"status": "committed"}"#)?;
        fs::write(root.join("gap-ledger.json"), r#"{"gaps": []}"#)?;
        fs::create_dir_all(root.join("specs/elicitation"))?;
        fs::write(
            root.join("specs/elicitation/login.md"),
            "---\nspec_id: SPEC-7\nready_for_planning: true\nblocking_unknowns: []\n---\n",
        )?;
        fs::create_dir_all(root.join("prompts"))?;
        fs::write(root.join("prompts/login.md"), "Do the thing\n")?;
        Ok(ws)
    }

    #[test]
    fn healthy_workspace_passes() -> Result<()> {
        let ws = healthy_workspace("true")?;

        ceres(ws.path())?
            .args(["preflight", "--mode", "execute", "--task-id", "T-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Preflight checks passed (execute mode)."));

        let events = read_jsonl(&ws.path().join("logs/events.jsonl"))?;
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(|e| e["type"] == "gate"));
        assert_eq!(events[8]["stage"], "lifecycle_enforcement");
        assert_eq!(events[8]["spec_id"], "SPEC-7");
        assert_eq!(events[8]["task_id"], "T-1");

        let report = fs::read_to_string(ws.path().join("logs/prompt-debug-report.yaml"))?;
        assert!(report.contains("status: approved"));
        Ok(())
    }

    #[test]
    fn draft_objective_fails_execute() -> Result<()> {
        let ws = healthy_workspace("true")?;
        fs::write(ws.path().join("objective-contract.json"), r#"{"status": "draft"}"#)?;

        ceres(ws.path())?
            .args(["preflight", "--mode", "execute"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Preflight failed at objective_status"));

        let events = read_jsonl(&ws.path().join("logs/events.jsonl"))?;
        let last = events.last().cloned().unwrap_or_default();
        assert_eq!(last["status"], "fail");
        assert_eq!(last["context"]["stage"], "objective_status");

        ceres(ws.path())?
            .args(["preflight", "--mode", "plan"])
            .assert()
            .success();
        Ok(())
    }

    #[test]
    fn missing_collaborator_exits_127() -> Result<()> {
        let ws = healthy_workspace("ceres-no-such-lifecycle-tool")?;

        ceres(ws.path())?
            .args(["preflight", "--mode", "execute"])
            .assert()
            .code(127)
            .stderr(predicate::str::contains("Preflight failed at lifecycle_enforcement"));
        Ok(())
    }
}

// ============================================================================
// log-event / auto-governance
// ============================================================================

#[test]
fn log_event_appends_to_explicit_file() -> Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("audit/events.jsonl");

    let mut cmd = assert_cmd::Command::cargo_bin("ceres")?;
    cmd.env_remove("CERES_WORKSPACE")
        .current_dir(dir.path())
        .args(["log-event", "--type", "check", "--status", "warn", "--message", "lint"])
        .args(["--context", r#"{"files": 3}"#])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let events = read_jsonl(&out)?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "check");
    assert_eq!(events[0]["status"], "warn");
    assert_eq!(events[0]["context"]["files"], 3);
    Ok(())
}

#[test]
fn log_event_rejects_bad_context() -> Result<()> {
    let ws = TempDir::new()?;
    ceres(ws.path())?
        .args(["log-event", "--type", "t", "--status", "info", "--message", "m"])
        .args(["--context", "{broken"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse context JSON"));

    assert!(!ws.path().join("logs/events.jsonl").exists());
    Ok(())
}

#[test]
fn auto_governance_applies_strict_preset_to_unhealthy_workspace() -> Result<()> {
    let ws = TempDir::new()?;
    write_settings(ws.path(), r#"{"output_density": "verbose"}"#)?;

    ceres(ws.path())?
        .arg("auto-governance")
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied strict preset"))
        .stdout(predicate::str::contains("objective_contract_missing"));

    let settings: JsonValue =
        serde_json::from_str(&fs::read_to_string(ws.path().join("modes_settings_profiles.json"))?)?;
    assert_eq!(settings["session_overrides"]["enforcement"], "strict");
    assert_eq!(settings["session_overrides"]["output_density"], "verbose");

    let events = read_jsonl(&ws.path().join("logs/events.jsonl"))?;
    assert_eq!(events[0]["type"], "auto_governance");
    assert_eq!(events[0]["status"], "warn");
    Ok(())
}

#[test]
fn auto_governance_without_settings_is_a_no_op() -> Result<()> {
    let ws = TempDir::new()?;
    ceres(ws.path())?
        .arg("auto-governance")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));

    assert!(!ws.path().join("logs/events.jsonl").exists());
    Ok(())
}
