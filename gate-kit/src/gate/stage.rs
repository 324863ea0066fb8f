use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::pipeline::GateRun;
use crate::error::GateKitError;
use crate::error::exit_codes;
use crate::types::EventStatus;

// ============================================================================
// Stage identity
// ============================================================================

/// Preflight stages in canonical order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    PolicyAdvisory,
    PromptPresence,
    PromptReport,
    ObjectiveStatus,
    Elicitation,
    GapLedger,
    PromptHygiene,
    ContractValidation,
    LifecycleEnforcement,
}

impl StageId {
    pub fn all() -> [Self; 9] {
        [
            Self::PolicyAdvisory,
            Self::PromptPresence,
            Self::PromptReport,
            Self::ObjectiveStatus,
            Self::Elicitation,
            Self::GapLedger,
            Self::PromptHygiene,
            Self::ContractValidation,
            Self::LifecycleEnforcement,
        ]
    }

    /// Identifier recorded in gate events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyAdvisory => "policy_advisory",
            Self::PromptPresence => "prompt_presence",
            Self::PromptReport => "prompt_report",
            Self::ObjectiveStatus => "objective_status",
            Self::Elicitation => "elicitation",
            Self::GapLedger => "gap_ledger",
            Self::PromptHygiene => "prompt_hygiene",
            Self::ContractValidation => "contract_validation",
            Self::LifecycleEnforcement => "lifecycle_enforcement",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Stage results
// ============================================================================

/// Why a stage stopped the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: StageId,
    pub reason: String,
    pub details: Value,
    pub exit_code: i32,
}

impl StageFailure {
    pub fn new(stage: StageId, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
            details: Value::Null,
            exit_code: exit_codes::FAILURE,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Failure carrying the message, details and exit code of `err`.
    pub fn from_error(stage: StageId, err: &GateKitError) -> Self {
        Self {
            stage,
            reason: err.to_string(),
            details: err.details(),
            exit_code: err.exit_code(),
        }
    }
}

impl From<StageFailure> for GateKitError {
    fn from(failure: StageFailure) -> Self {
        GateKitError::StageFailure {
            stage: failure.stage.as_str().to_string(),
            reason: failure.reason,
            details: failure.details,
            exit_code: failure.exit_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Passed {
        message: String,
    },
    /// Recorded but never blocking.
    Advisory {
        status: EventStatus,
        message: String,
        context: Value,
    },
    /// Preconditions for running the stage are absent.
    Skipped {
        message: String,
    },
    Failed(StageFailure),
}

impl StageOutcome {
    pub fn passed(message: impl Into<String>) -> Self {
        Self::Passed {
            message: message.into(),
        }
    }

    pub fn failed(stage: StageId, reason: impl Into<String>) -> Self {
        Self::Failed(StageFailure::new(stage, reason))
    }

    pub fn event_status(&self) -> EventStatus {
        match self {
            Self::Passed { .. } => EventStatus::Pass,
            Self::Advisory { status, .. } => *status,
            Self::Skipped { .. } => EventStatus::Info,
            Self::Failed(_) => EventStatus::Fail,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One admission check.
pub trait Stage {
    fn id(&self) -> StageId;

    /// Evaluate the stage. Stages may enrich `run.context` for later stages.
    fn run(&self, run: &mut GateRun) -> StageOutcome;
}
