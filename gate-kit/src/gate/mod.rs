//! Preflight gate pipeline
//!
//! A fixed, ordered sequence of fail-fast admission checks. Every stage
//! that runs records one gate event; the first failure ends the run.

pub mod artifacts;
pub mod collaborators;
pub mod frontmatter;
pub mod hygiene;
mod pipeline;
mod stage;
pub mod stages;

pub use collaborators::{
    CheckRequest, Collaborators, ExternalCommand, ExternalGovernanceCheck, ExternalPromptDebugger,
    GovernanceCheck, PromptDebugger, PromptReport,
};
pub use pipeline::{GateInputs, GatePipeline, GateRun, GateVerdict};
pub use stage::{Stage, StageFailure, StageId, StageOutcome};
