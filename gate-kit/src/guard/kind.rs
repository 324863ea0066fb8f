use serde::de::DeserializeOwned;

/// Constraint on one block field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// String drawn from a closed set.
    OneOf(&'static [&'static str]),
    Bool,
}

/// One required field of a kind's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub rule: FieldRule,
}

impl FieldSpec {
    pub const fn one_of(key: &'static str, allowed: &'static [&'static str]) -> Self {
        Self {
            key,
            rule: FieldRule::OneOf(allowed),
        }
    }

    pub const fn boolean(key: &'static str) -> Self {
        Self {
            key,
            rule: FieldRule::Bool,
        }
    }
}

/// A governed document kind.
pub trait DocumentKind {
    /// Top-level block key and diff prefix.
    const NAME: &'static str;

    /// Human-facing name used in messages.
    const LABEL: &'static str;

    /// Required block fields.
    const FIELDS: &'static [FieldSpec];

    /// Typed view of a valid block.
    type Block: DeserializeOwned;

    /// Semantic warnings over a valid block, in rule order.
    fn warnings(block: &Self::Block) -> Vec<String>;
}
