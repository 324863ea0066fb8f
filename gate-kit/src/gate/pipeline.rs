use std::path::PathBuf;

use serde_json::json;

use super::collaborators::Collaborators;
use super::stage::Stage;
use super::stage::StageFailure;
use super::stage::StageId;
use super::stage::StageOutcome;
use super::stages;
use crate::config::GateKitConfig;
use crate::config::PromptHygieneConfig;
use crate::error::Result;
use crate::events::EventLog;
use crate::events::GateEvent;
use crate::types::EventStatus;
use crate::types::GateContext;
use crate::workspace::Workspace;

/// Absolute artifact locations for one preflight run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateInputs {
    pub policy: PathBuf,
    pub prompt: PathBuf,
    pub prompt_report: PathBuf,
    pub todo: PathBuf,
    pub gap_ledger: PathBuf,
    pub objective: PathBuf,
    pub elicitation: PathBuf,
    pub prompts_dir: PathBuf,
    pub events_log: PathBuf,
    pub hygiene: PromptHygieneConfig,
}

impl GateInputs {
    pub fn from_config(workspace: &Workspace, config: &GateKitConfig) -> Self {
        let paths = &config.paths;
        Self {
            policy: workspace.resolve(&paths.policy),
            prompt: workspace.resolve(&paths.prompt),
            prompt_report: workspace.resolve(&paths.prompt_report),
            todo: workspace.resolve(&paths.todo),
            gap_ledger: workspace.resolve(&paths.gap_ledger),
            objective: workspace.resolve(&paths.objective),
            elicitation: workspace.resolve(&paths.elicitation),
            prompts_dir: workspace.resolve(&paths.prompts_dir),
            events_log: workspace.resolve(&paths.events_log),
            hygiene: config.prompt_hygiene.clone(),
        }
    }
}

/// Mutable state threaded through the stages of one run.
#[derive(Debug, Clone)]
pub struct GateRun {
    pub context: GateContext,
    pub inputs: GateInputs,
}

impl GateRun {
    pub fn new(context: GateContext, inputs: GateInputs) -> Self {
        Self { context, inputs }
    }
}

/// Final result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Passed { stages: Vec<StageId> },
    Failed(StageFailure),
}

impl GateVerdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Ordered, fail-fast admission pipeline.
///
/// Each executed stage appends exactly one gate event. The first failing
/// stage ends the run; later stages never execute. Nothing is retried, and
/// a new run always starts again from the first stage.
pub struct GatePipeline {
    stages: Vec<Box<dyn Stage>>,
    events: EventLog,
}

impl GatePipeline {
    pub fn new(events: EventLog) -> Self {
        Self {
            stages: Vec::new(),
            events,
        }
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The nine preflight stages in canonical order.
    pub fn standard(events: EventLog, collaborators: Collaborators) -> Self {
        let Collaborators {
            prompt_debugger,
            contract_validator,
            lifecycle_enforcer,
        } = collaborators;

        Self::new(events)
            .with_stage(stages::PolicyAdvisoryStage)
            .with_stage(stages::PromptPresenceStage)
            .with_stage(stages::PromptReportStage::new(prompt_debugger))
            .with_stage(stages::ObjectiveStatusStage)
            .with_stage(stages::ElicitationStage)
            .with_stage(stages::GapLedgerStage)
            .with_stage(stages::PromptHygieneStage)
            .with_stage(stages::GovernanceCheckStage::contract_validation(
                contract_validator,
            ))
            .with_stage(stages::GovernanceCheckStage::lifecycle_enforcement(
                lifecycle_enforcer,
            ))
    }

    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id()).collect()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Run every stage in order until one fails.
    ///
    /// `Err` is reserved for failures to write the audit log.
    pub fn run(&self, run: &mut GateRun) -> Result<GateVerdict> {
        let mut executed = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let id = stage.id();
            tracing::debug!(stage = %id, mode = %run.context.mode, "running gate stage");

            let outcome = stage.run(run);
            let status = outcome.event_status();
            let event = match &outcome {
                StageOutcome::Passed { message } | StageOutcome::Skipped { message } => {
                    GateEvent::new(&run.context, id.as_str(), status, message.as_str())
                }
                StageOutcome::Advisory {
                    message, context, ..
                } => GateEvent::new(&run.context, id.as_str(), status, message.as_str())
                    .with_context(context.clone()),
                StageOutcome::Failed(failure) => {
                    GateEvent::new(&run.context, id.as_str(), status, failure.reason.as_str())
                        .with_context(json!({
                            "stage": id.as_str(),
                            "reason": failure.reason,
                            "details": failure.details,
                        }))
                }
            };
            self.events.append(&event)?;
            executed.push(id);

            match outcome {
                StageOutcome::Failed(failure) => {
                    tracing::warn!(stage = %id, reason = %failure.reason, "gate stage failed");
                    return Ok(GateVerdict::Failed(failure));
                }
                StageOutcome::Advisory {
                    status: EventStatus::Warn,
                    message,
                    ..
                } => tracing::warn!(stage = %id, "{message}"),
                _ => tracing::info!(stage = %id, "gate stage passed"),
            }
        }

        Ok(GateVerdict::Passed { stages: executed })
    }
}
