//! Loading of YAML/JSON governance documents

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::GateKitError;
use crate::error::Result;

/// Resolve `raw` against `root` unless it is already absolute.
pub fn resolve_path(root: &Path, raw: impl AsRef<Path>) -> PathBuf {
    let raw = raw.as_ref();
    if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        root.join(raw)
    }
}

/// Read a text artifact. A missing file is `ConfigNotFound`.
pub fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(GateKitError::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(GateKitError::io(path, e)),
    }
}

/// Parse text as YAML, falling back to JSON. The top level must be a
/// mapping; an empty document counts as an empty mapping.
pub fn parse_yaml_or_json(content: &str, label: &str, path: &Path) -> Result<Value> {
    let parsed = match serde_yaml::from_str::<Value>(content) {
        Ok(value) => value,
        Err(yaml_err) => serde_json::from_str::<Value>(content).map_err(|json_err| {
            GateKitError::Parse {
                label: label.to_string(),
                path: path.to_path_buf(),
                reason: format!("YAML: {yaml_err}; JSON: {json_err}"),
            }
        })?,
    };

    match parsed {
        Value::Object(_) => Ok(parsed),
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        _ => Err(GateKitError::Parse {
            label: label.to_string(),
            path: path.to_path_buf(),
            reason: format!("{label} must be an object"),
        }),
    }
}

/// Read and parse a YAML or JSON document.
pub fn load_yaml_or_json(path: &Path, label: &str) -> Result<Value> {
    let content = read_text(path)?;
    parse_yaml_or_json(&content, label, path)
}

/// Read and parse a JSON document.
pub fn load_json(path: &Path, label: &str) -> Result<Value> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|e| GateKitError::Parse {
        label: label.to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
