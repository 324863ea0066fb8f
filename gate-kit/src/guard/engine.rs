use std::fs;
use std::path::Path;

use serde_json::Map;
use serde_json::Value;

use super::kind::DocumentKind;
use super::kind::FieldRule;
use crate::error::GateKitError;
use crate::error::Result;

fn block_of<'a, K: DocumentKind>(doc: &'a Value) -> Option<&'a Map<String, Value>> {
    doc.get(K::NAME).and_then(Value::as_object)
}

/// Schema errors of `doc`. Never returns warnings.
pub fn validate<K: DocumentKind>(doc: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let version_ok = doc
        .get("version")
        .and_then(Value::as_i64)
        .is_some_and(|v| v >= 1);
    if !version_ok {
        errors.push("version must be an integer >= 1".to_string());
    }

    let Some(block) = block_of::<K>(doc) else {
        errors.push(format!("{} block missing or invalid", K::NAME));
        return errors;
    };

    for field in K::FIELDS {
        let value = block.get(field.key);
        match field.rule {
            FieldRule::OneOf(allowed) => {
                let ok = value
                    .and_then(Value::as_str)
                    .is_some_and(|s| allowed.contains(&s));
                if !ok {
                    errors.push(format!(
                        "{}.{} must be one of [{}]",
                        K::NAME,
                        field.key,
                        allowed.join(", ")
                    ));
                }
            }
            FieldRule::Bool => {
                if !value.is_some_and(Value::is_boolean) {
                    errors.push(format!("{}.{} must be a boolean", K::NAME, field.key));
                }
            }
        }
    }

    errors
}

/// Semantic warnings of an already valid `doc`.
///
/// Callers validate first; an invalid document yields no warnings.
pub fn warn<K: DocumentKind>(doc: &Value) -> Vec<String> {
    let Some(block) = doc.get(K::NAME) else {
        return Vec::new();
    };
    match serde_json::from_value::<K::Block>(block.clone()) {
        Ok(block) => K::warnings(&block),
        Err(e) => {
            tracing::debug!(kind = K::NAME, error = %e, "warn called on invalid block");
            Vec::new()
        }
    }
}

/// Field-level changes between two documents, `<kind>.<key>: old -> new`,
/// in sorted key order. Only declared schema keys are compared.
pub fn diff<K: DocumentKind>(current: &Value, proposed: &Value) -> Vec<String> {
    let current_block = block_of::<K>(current);
    let proposed_block = block_of::<K>(proposed);

    let mut keys: Vec<&str> = K::FIELDS.iter().map(|field| field.key).collect();
    keys.sort_unstable();

    keys.into_iter()
        .filter_map(|key| {
            let old = current_block.and_then(|b| b.get(key));
            let new = proposed_block.and_then(|b| b.get(key));
            (old != new).then(|| {
                format!("{}.{key}: {} -> {}", K::NAME, render(old), render(new))
            })
        })
        .collect()
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Overwrite `current_path` with the exact bytes of `proposed_path`.
pub fn apply(proposed_path: &Path, current_path: &Path) -> Result<()> {
    let bytes = fs::read(proposed_path).map_err(|e| GateKitError::io(proposed_path, e))?;
    fs::write(current_path, bytes).map_err(|e| GateKitError::io(current_path, e))?;
    tracing::info!(
        from = %proposed_path.display(),
        to = %current_path.display(),
        "applied guarded change"
    );
    Ok(())
}
