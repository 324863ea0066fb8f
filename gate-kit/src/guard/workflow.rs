use serde::Deserialize;
use serde::Serialize;

use super::kind::DocumentKind;
use super::kind::FieldSpec;

/// The `workflow` block of `ceres.workflow.yaml`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WorkflowBlock {
    pub auto_housekeeping: bool,
    pub auto_push: bool,
    pub announce_push: bool,
}

/// Macro workflow settings document.
pub struct WorkflowKind;

impl DocumentKind for WorkflowKind {
    const NAME: &'static str = "workflow";
    const LABEL: &'static str = "workflow config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::boolean("auto_housekeeping"),
        FieldSpec::boolean("auto_push"),
        FieldSpec::boolean("announce_push"),
    ];

    type Block = WorkflowBlock;

    fn warnings(block: &WorkflowBlock) -> Vec<String> {
        let mut warnings = Vec::new();
        if !block.auto_housekeeping {
            warnings.push(
                "auto_housekeeping disabled; completed tasks may drift without manual sync"
                    .to_string(),
            );
        }
        if !block.auto_push && block.announce_push {
            warnings.push(
                "announce_push enabled but auto_push disabled; remember to report manual pushes"
                    .to_string(),
            );
        }
        warnings
    }
}
