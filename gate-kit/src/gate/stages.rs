//! The preflight stages

use serde_json::json;

use super::artifacts::ElicitationRecord;
use super::artifacts::GapLedger;
use super::artifacts::ObjectiveContract;
use super::artifacts::resolve_elicitation;
use super::collaborators::CheckRequest;
use super::collaborators::GovernanceCheck;
use super::collaborators::PromptDebugger;
use super::hygiene::check_prompt_hygiene;
use super::pipeline::GateRun;
use super::stage::Stage;
use super::stage::StageFailure;
use super::stage::StageId;
use super::stage::StageOutcome;
use crate::document::load_yaml_or_json;
use crate::document::read_text;
use crate::guard;
use crate::guard::PolicyKind;
use crate::types::EventStatus;
use crate::types::GateMode;

/// Advisory run of the policy guard over the live policy. Never fails.
pub struct PolicyAdvisoryStage;

impl Stage for PolicyAdvisoryStage {
    fn id(&self) -> StageId {
        StageId::PolicyAdvisory
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let path = &run.inputs.policy;
        let advisory = |status, message: String, context| StageOutcome::Advisory {
            status,
            message,
            context,
        };

        if !path.is_file() {
            return advisory(
                EventStatus::Warn,
                format!("Policy not found: {} (advisory)", path.display()),
                json!({ "path": path }),
            );
        }

        let doc = match load_yaml_or_json(path, "Policy") {
            Ok(doc) => doc,
            Err(e) => {
                return advisory(EventStatus::Warn, format!("{e} (advisory)"), e.details());
            }
        };

        let errors = guard::validate::<PolicyKind>(&doc);
        if !errors.is_empty() {
            return advisory(
                EventStatus::Warn,
                "Policy schema errors (advisory)".to_string(),
                json!({ "errors": errors }),
            );
        }

        let warnings = guard::warn::<PolicyKind>(&doc);
        if warnings.is_empty() {
            advisory(
                EventStatus::Info,
                "Policy advisory check clean".to_string(),
                serde_json::Value::Null,
            )
        } else {
            advisory(
                EventStatus::Warn,
                "Policy warnings (advisory)".to_string(),
                json!({ "warnings": warnings }),
            )
        }
    }
}

/// The prompt artifact must exist as a file.
pub struct PromptPresenceStage;

impl Stage for PromptPresenceStage {
    fn id(&self) -> StageId {
        StageId::PromptPresence
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let prompt = &run.inputs.prompt;
        if prompt.is_file() {
            StageOutcome::passed(format!("Prompt file present: {}", prompt.display()))
        } else {
            StageOutcome::Failed(
                StageFailure::new(
                    self.id(),
                    format!("Prompt file not found: {}", prompt.display()),
                )
                .with_details(json!({ "path": prompt })),
            )
        }
    }
}

/// The prompt debugger must approve the prompt.
pub struct PromptReportStage {
    debugger: Box<dyn PromptDebugger>,
}

impl PromptReportStage {
    pub fn new(debugger: Box<dyn PromptDebugger>) -> Self {
        Self { debugger }
    }
}

impl Stage for PromptReportStage {
    fn id(&self) -> StageId {
        StageId::PromptReport
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let report = match self
            .debugger
            .debug(&run.inputs.prompt, &run.inputs.prompt_report)
        {
            Ok(report) => report,
            Err(e) => return StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        };

        if report.is_approved() {
            return StageOutcome::passed("Prompt Debug Report approved");
        }

        let status = report.status_text();
        StageOutcome::Failed(
            StageFailure::new(
                self.id(),
                format!("Prompt Debug Report status is '{status}'. Resolve issues before proceeding."),
            )
            .with_details(json!({
                "status": report.status,
                "issues": report.issues,
                "suggested_fix": report.suggested_fix,
                "report": run.inputs.prompt_report,
            })),
        )
    }
}

/// The Objective Contract status must admit the mode.
pub struct ObjectiveStatusStage;

impl Stage for ObjectiveStatusStage {
    fn id(&self) -> StageId {
        StageId::ObjectiveStatus
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let path = &run.inputs.objective;
        if !path.is_file() {
            return StageOutcome::Failed(
                StageFailure::new(
                    self.id(),
                    format!("Objective Contract missing: {}", path.display()),
                )
                .with_details(json!({ "path": path })),
            );
        }

        let objective = match ObjectiveContract::load(path) {
            Ok(objective) => objective,
            Err(e) => return StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        };

        match objective.admits(run.context.mode) {
            Ok(()) => StageOutcome::passed(format!(
                "Objective Contract status '{}' admits {} mode",
                objective.status.as_deref().unwrap_or("null"),
                run.context.mode
            )),
            Err(reason) => StageOutcome::Failed(
                StageFailure::new(self.id(), reason)
                    .with_details(json!({ "status": objective.status, "mode": run.context.mode })),
            ),
        }
    }
}

/// Exactly one ready Elicitation Record; its `spec_id` joins the context.
pub struct ElicitationStage;

impl Stage for ElicitationStage {
    fn id(&self) -> StageId {
        StageId::Elicitation
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let record = match resolve_elicitation(&run.inputs.elicitation)
            .and_then(|path| ElicitationRecord::load(&path))
        {
            Ok(record) => record,
            Err(e) => return StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        };

        let problems = record.readiness_problems();
        if !problems.is_empty() {
            return StageOutcome::Failed(
                StageFailure::new(self.id(), problems.join(" "))
                    .with_details(json!({ "path": record.path, "problems": problems })),
            );
        }

        run.context.spec_id = record.spec_id.clone();
        StageOutcome::passed(format!(
            "Spec Elicitation Record ready ({})",
            record.spec_id.as_deref().unwrap_or_default()
        ))
    }
}

/// The Gap Ledger must parse; execute mode tolerates no blocking gaps.
pub struct GapLedgerStage;

impl Stage for GapLedgerStage {
    fn id(&self) -> StageId {
        StageId::GapLedger
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let path = &run.inputs.gap_ledger;
        if !path.is_file() {
            return StageOutcome::Failed(
                StageFailure::new(self.id(), format!("Gap Ledger missing: {}", path.display()))
                    .with_details(json!({ "path": path })),
            );
        }

        let ledger = match GapLedger::load(path) {
            Ok(ledger) => ledger,
            Err(e) => return StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        };

        let blocking: Vec<&str> = ledger
            .blocking_unresolved()
            .iter()
            .map(|gap| gap.display_id())
            .collect();

        if blocking.is_empty() {
            return StageOutcome::passed(format!(
                "Gap Ledger clear ({} entries)",
                ledger.gaps.len()
            ));
        }

        match run.context.mode {
            GateMode::Execute => StageOutcome::Failed(
                StageFailure::new(
                    self.id(),
                    format!("Blocking gaps unresolved: {}", blocking.join(", ")),
                )
                .with_details(json!({ "gap_ids": blocking })),
            ),
            GateMode::Plan => StageOutcome::Advisory {
                status: EventStatus::Warn,
                message: format!(
                    "Blocking gaps unresolved (allowed in plan mode): {}",
                    blocking.join(", ")
                ),
                context: json!({ "gap_ids": blocking }),
            },
        }
    }
}

/// Task Plan and prompts directory must agree. Skipped without a prompts
/// directory.
pub struct PromptHygieneStage;

impl Stage for PromptHygieneStage {
    fn id(&self) -> StageId {
        StageId::PromptHygiene
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let prompts_dir = &run.inputs.prompts_dir;
        if !prompts_dir.is_dir() {
            return StageOutcome::Skipped {
                message: format!(
                    "Prompts directory not present ({}); hygiene check skipped",
                    prompts_dir.display()
                ),
            };
        }

        let plan = match read_text(&run.inputs.todo) {
            Ok(plan) => plan,
            Err(e) => return StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        };

        match check_prompt_hygiene(&plan, prompts_dir, &run.inputs.hygiene) {
            Ok(report) if report.is_clean() => StageOutcome::passed("Prompt hygiene clean"),
            Ok(report) => {
                let details = json!({
                    "completed_refs": report.completed_refs,
                    "missing_refs": report.missing_refs,
                    "orphans": report.orphans,
                });
                StageOutcome::Failed(
                    StageFailure::new(
                        self.id(),
                        format!("Prompt hygiene violations: {}", report.violation_count()),
                    )
                    .with_details(details),
                )
            }
            Err(e) => StageOutcome::Failed(StageFailure::from_error(self.id(), &e)),
        }
    }
}

/// Delegation to an external governance check.
pub struct GovernanceCheckStage {
    id: StageId,
    check: Box<dyn GovernanceCheck>,
}

impl GovernanceCheckStage {
    pub fn contract_validation(check: Box<dyn GovernanceCheck>) -> Self {
        Self {
            id: StageId::ContractValidation,
            check,
        }
    }

    pub fn lifecycle_enforcement(check: Box<dyn GovernanceCheck>) -> Self {
        Self {
            id: StageId::LifecycleEnforcement,
            check,
        }
    }
}

impl Stage for GovernanceCheckStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn run(&self, run: &mut GateRun) -> StageOutcome {
        let request = CheckRequest {
            context: &run.context,
            inputs: &run.inputs,
        };
        match self.check.check(&request) {
            Ok(()) => StageOutcome::passed(format!("{} passed", self.check.name())),
            Err(e) => StageOutcome::Failed(StageFailure::from_error(self.id, &e)),
        }
    }
}
