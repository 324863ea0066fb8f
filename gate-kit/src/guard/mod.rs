//! Guarded config change: validate, warn, diff, confirm, apply
//!
//! One engine serves every governed document kind. A kind supplies its
//! block key, field schema and warning rules through [`DocumentKind`].

mod confirm;
mod edit;
mod engine;
mod kind;
mod policy;
mod run;
mod workflow;

pub use confirm::{Confirmer, NonInteractive, confirm_if_needed};
pub use edit::ensure_proposed;
pub use engine::{apply, diff, validate, warn};
pub use kind::{DocumentKind, FieldRule, FieldSpec};
pub use policy::{
    AutonomyLevel, ExecutionContinuity, ObservabilityDepth, PolicyBlock, PolicyKind, RigorLevel,
    RiskTolerance,
};
pub use run::{GuardOutcome, GuardReport, GuardRequest, GuardRun, run_guard};
pub use workflow::{WorkflowBlock, WorkflowKind};

use crate::error::Result;

/// Runtime selector over the document kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GuardKind {
    Policy,
    Workflow,
}

impl GuardKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Policy => PolicyKind::LABEL,
            Self::Workflow => WorkflowKind::LABEL,
        }
    }

    /// Default location of the edit copy.
    pub fn default_proposed(&self) -> &'static str {
        match self {
            Self::Policy => "ceres.policy.proposed.yaml",
            Self::Workflow => "ceres.workflow.proposed.yaml",
        }
    }

    /// Run the guard workflow for this kind.
    pub fn run_guard(&self, request: &GuardRequest, confirmer: &dyn Confirmer) -> Result<GuardRun> {
        match self {
            Self::Policy => run_guard::<PolicyKind>(request, confirmer),
            Self::Workflow => run_guard::<WorkflowKind>(request, confirmer),
        }
    }
}
