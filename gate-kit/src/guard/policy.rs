use serde::Deserialize;
use serde::Serialize;

use super::kind::DocumentKind;
use super::kind::FieldSpec;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigorLevel {
    Low,
    Standard,
    High,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    Minimal,
    Constrained,
    Advanced,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionContinuity {
    Manual,
    AutoSafe,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservabilityDepth {
    Normal,
    Verbose,
}

/// The `policy` block of `ceres.policy.yaml`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PolicyBlock {
    pub rigor_level: RigorLevel,
    pub autonomy_level: AutonomyLevel,
    pub risk_tolerance: RiskTolerance,
    pub execution_continuity: ExecutionContinuity,
    pub observability_depth: ObservabilityDepth,
}

/// Macro policy document.
pub struct PolicyKind;

impl DocumentKind for PolicyKind {
    const NAME: &'static str = "policy";
    const LABEL: &'static str = "policy";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::one_of("rigor_level", &["low", "standard", "high"]),
        FieldSpec::one_of("autonomy_level", &["minimal", "constrained", "advanced"]),
        FieldSpec::one_of("risk_tolerance", &["low", "medium", "high"]),
        FieldSpec::one_of("execution_continuity", &["manual", "auto-safe"]),
        FieldSpec::one_of("observability_depth", &["normal", "verbose"]),
    ];

    type Block = PolicyBlock;

    fn warnings(block: &PolicyBlock) -> Vec<String> {
        use AutonomyLevel::Advanced;

        let mut warnings = Vec::new();
        if block.autonomy_level == Advanced && block.risk_tolerance == RiskTolerance::Low {
            warnings.push("advanced autonomy with low risk tolerance may be contradictory".to_string());
        }
        if block.execution_continuity == ExecutionContinuity::AutoSafe
            && block.rigor_level == RigorLevel::Low
        {
            warnings.push("auto-safe execution with low rigor may be unsafe".to_string());
        }
        if block.observability_depth == ObservabilityDepth::Normal
            && block.rigor_level == RigorLevel::High
        {
            warnings.push("high rigor with normal observability may reduce auditability".to_string());
        }
        if block.autonomy_level == Advanced
            && block.execution_continuity != ExecutionContinuity::Manual
        {
            warnings.push("advanced autonomy should remain manual execution continuity".to_string());
        }
        if block.risk_tolerance == RiskTolerance::High && block.rigor_level == RigorLevel::Low {
            warnings.push("high risk tolerance with low rigor may increase drift".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::FieldRule;

    #[test]
    fn every_allowed_value_deserializes() {
        for field in PolicyKind::FIELDS {
            let FieldRule::OneOf(allowed) = field.rule else {
                panic!("policy fields are enums");
            };
            for value in allowed {
                let mut block = serde_json::json!({
                    "rigor_level": "standard",
                    "autonomy_level": "minimal",
                    "risk_tolerance": "medium",
                    "execution_continuity": "manual",
                    "observability_depth": "verbose"
                });
                block[field.key] = serde_json::json!(value);
                let parsed: Result<PolicyBlock, _> = serde_json::from_value(block);
                assert!(parsed.is_ok(), "{}={value} should parse", field.key);
            }
        }
    }

    #[test]
    fn balanced_policy_has_no_warnings() {
        let block = PolicyBlock {
            rigor_level: RigorLevel::Standard,
            autonomy_level: AutonomyLevel::Constrained,
            risk_tolerance: RiskTolerance::Medium,
            execution_continuity: ExecutionContinuity::Manual,
            observability_depth: ObservabilityDepth::Verbose,
        };
        assert!(PolicyKind::warnings(&block).is_empty());
    }

    #[test]
    fn high_risk_low_rigor_warns() {
        let block = PolicyBlock {
            rigor_level: RigorLevel::Low,
            autonomy_level: AutonomyLevel::Minimal,
            risk_tolerance: RiskTolerance::High,
            execution_continuity: ExecutionContinuity::Manual,
            observability_depth: ObservabilityDepth::Normal,
        };
        assert_eq!(
            PolicyKind::warnings(&block),
            vec!["high risk tolerance with low rigor may increase drift"]
        );
    }
}
