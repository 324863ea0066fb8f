//! Readers for the planning artifacts the gate inspects

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use super::frontmatter::FrontMatter;
use super::frontmatter::FrontMatterValue;
use super::frontmatter::parse_front_matter;
use crate::document::load_yaml_or_json;
use crate::document::read_text;
use crate::error::GateKitError;
use crate::error::Result;
use crate::types::GateMode;

pub const ELICITATION_LABEL: &str = "Spec Elicitation Record";
pub const OBJECTIVE_LABEL: &str = "Objective Contract";
pub const GAP_LEDGER_LABEL: &str = "Gap Ledger";

// === Objective Contract ===

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveContract {
    pub status: Option<String>,
}

impl ObjectiveContract {
    pub fn load(path: &Path) -> Result<Self> {
        let doc = load_yaml_or_json(path, OBJECTIVE_LABEL)?;
        Ok(Self::from_value(&doc))
    }

    pub fn from_value(doc: &Value) -> Self {
        Self {
            status: doc.get("status").and_then(Value::as_str).map(str::to_string),
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status.as_deref() == Some("committed")
    }

    /// `committed` for execute; `draft` or `committed` for plan.
    pub fn admits(&self, mode: GateMode) -> std::result::Result<(), String> {
        let status = self.status.as_deref();
        let found = status.unwrap_or("null");
        match mode {
            GateMode::Execute if status != Some("committed") => Err(format!(
                "Objective Contract status must be 'committed' for execute mode (found '{found}')."
            )),
            GateMode::Plan if !matches!(status, Some("draft" | "committed")) => Err(format!(
                "Objective Contract status must be draft or committed for plan mode (found '{found}')."
            )),
            _ => Ok(()),
        }
    }
}

// === Gap Ledger ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapEntry {
    pub gap_id: Option<String>,
    pub blocking: bool,
    pub status: Option<String>,
}

impl GapEntry {
    /// Lenient read of one entry; non-object entries are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let gap_id = entry.get("gap_id").and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        Some(Self {
            gap_id,
            blocking: entry.get("blocking").and_then(Value::as_bool) == Some(true),
            status: entry.get("status").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// Blocking and not yet resolved.
    pub fn blocks_gate(&self) -> bool {
        self.blocking && self.status.as_deref() != Some("resolved")
    }

    pub fn display_id(&self) -> &str {
        self.gap_id.as_deref().unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapLedger {
    pub gaps: Vec<GapEntry>,
}

impl GapLedger {
    pub fn load(path: &Path) -> Result<Self> {
        let doc = load_yaml_or_json(path, GAP_LEDGER_LABEL)?;
        Self::from_value(&doc, path)
    }

    pub fn from_value(doc: &Value, path: &Path) -> Result<Self> {
        let Some(gaps) = doc.get("gaps").and_then(Value::as_array) else {
            return Err(GateKitError::Parse {
                label: GAP_LEDGER_LABEL.to_string(),
                path: path.to_path_buf(),
                reason: "Gap Ledger must contain a 'gaps' list".to_string(),
            });
        };
        Ok(Self {
            gaps: gaps.iter().filter_map(GapEntry::from_value).collect(),
        })
    }

    pub fn blocking_unresolved(&self) -> Vec<&GapEntry> {
        self.gaps.iter().filter(|gap| gap.blocks_gate()).collect()
    }
}

// === Elicitation Record ===

/// Pick the single elicitation record at `path`: the file itself, or the
/// sole `.md` file directly inside a directory.
pub fn resolve_elicitation(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        let entries = fs::read_dir(path).map_err(|e| GateKitError::io(path, e))?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        candidates.sort();

        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }
        return Err(GateKitError::AmbiguousArtifact {
            label: ELICITATION_LABEL.to_string(),
            location: path.to_path_buf(),
            candidates: candidates
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect(),
        });
    }

    if !path.is_file() {
        return Err(GateKitError::AmbiguousArtifact {
            label: ELICITATION_LABEL.to_string(),
            location: path.to_path_buf(),
            candidates: Vec::new(),
        });
    }
    Ok(path.to_path_buf())
}

/// Absent, blank, or a `<...>` template value.
pub fn is_placeholder(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => true,
        Some(v) => v.starts_with('<') && v.ends_with('>'),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElicitationRecord {
    pub path: PathBuf,
    pub spec_id: Option<String>,
    pub ready_for_planning: Option<bool>,
    /// `None` when the key is missing or not a list.
    pub blocking_unknowns: Option<Vec<String>>,
}

impl ElicitationRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        let front_matter = parse_front_matter(&text).map_err(|e| GateKitError::Parse {
            label: ELICITATION_LABEL.to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_front_matter(path, &front_matter))
    }

    pub fn from_front_matter(path: &Path, front_matter: &FrontMatter) -> Self {
        Self {
            path: path.to_path_buf(),
            spec_id: front_matter
                .get("spec_id")
                .and_then(FrontMatterValue::as_text)
                .map(str::to_string),
            ready_for_planning: front_matter
                .get("ready_for_planning")
                .and_then(FrontMatterValue::as_flag),
            blocking_unknowns: front_matter
                .get("blocking_unknowns")
                .and_then(FrontMatterValue::as_list)
                .map(<[String]>::to_vec),
        }
    }

    /// Every unmet readiness condition, empty when ready.
    pub fn readiness_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if is_placeholder(self.spec_id.as_deref()) {
            problems.push(format!("{ELICITATION_LABEL} spec_id is missing or a placeholder."));
        }
        if self.ready_for_planning != Some(true) {
            problems.push(format!("{ELICITATION_LABEL} not ready_for_planning=true."));
        }
        match &self.blocking_unknowns {
            None => problems.push(format!(
                "{ELICITATION_LABEL} missing blocking_unknowns list in front matter."
            )),
            Some(unknowns) if !unknowns.is_empty() => problems.push(format!(
                "{ELICITATION_LABEL} has blocking_unknowns: {}",
                unknowns.join(", ")
            )),
            Some(_) => {}
        }
        problems
    }
}
