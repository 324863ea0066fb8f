//! Prompt hygiene: the Task Plan and the prompts directory must agree
//!
//! A plan may not point at completed or missing prompts, and every live
//! prompt file has to be referenced from the plan.

use std::collections::BTreeSet;
use std::path::Path;

use regex_lite::Regex;
use walkdir::WalkDir;

use crate::config::PromptHygieneConfig;
use crate::error::GateKitError;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HygieneReport {
    /// References into the completed directory.
    pub completed_refs: Vec<String>,
    /// References to files that do not exist.
    pub missing_refs: Vec<String>,
    /// Live prompt files nothing references.
    pub orphans: Vec<String>,
}

impl HygieneReport {
    pub fn is_clean(&self) -> bool {
        self.completed_refs.is_empty() && self.missing_refs.is_empty() && self.orphans.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.completed_refs.len() + self.missing_refs.len() + self.orphans.len()
    }
}

/// Prompt paths referenced by `plan`, relative to the prompts directory
/// named `dir_name`. Sorted and de-duplicated.
pub fn prompt_references(plan: &str, dir_name: &str) -> Result<BTreeSet<String>> {
    let pattern = format!(
        r"(?:^|[^A-Za-z0-9_.\-])({}/[A-Za-z0-9_./\-]+\.md)",
        regex_lite::escape(dir_name)
    );
    let re = Regex::new(&pattern).map_err(|e| GateKitError::Parse {
        label: "prompt reference pattern".to_string(),
        path: dir_name.into(),
        reason: e.to_string(),
    })?;

    let prefix = format!("{dir_name}/");
    Ok(re
        .captures_iter(plan)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().strip_prefix(&prefix).map(str::to_string))
        .collect())
}

fn is_allowlisted(rel: &str, allowlist: &[String]) -> bool {
    allowlist.iter().any(|entry| {
        if entry.ends_with('/') {
            rel.starts_with(entry.as_str())
        } else {
            rel == entry
        }
    })
}

/// Check `plan` against the prompt files under `prompts_dir`.
pub fn check_prompt_hygiene(
    plan: &str,
    prompts_dir: &Path,
    config: &PromptHygieneConfig,
) -> Result<HygieneReport> {
    let dir_name = prompts_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prompts".to_string());
    let completed_prefix = format!("{}/", config.completed_dir.trim_end_matches('/'));

    let references = prompt_references(plan, &dir_name)?;
    let mut report = HygieneReport::default();

    for rel in &references {
        if rel.starts_with(&completed_prefix) {
            report.completed_refs.push(rel.clone());
        } else if !prompts_dir.join(rel).is_file() {
            report.missing_refs.push(rel.clone());
        }
    }

    for entry in WalkDir::new(prompts_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(prompts_dir).to_path_buf();
            GateKitError::io(path, std::io::Error::other(e.to_string()))
        })?;
        if !entry.file_type().is_file()
            || entry.path().extension().is_none_or(|ext| ext != "md")
        {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(prompts_dir) else {
            continue;
        };
        let rel = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if rel.starts_with(&completed_prefix) || is_allowlisted(&rel, &config.allowlist) {
            continue;
        }
        if !references.contains(&rel) {
            report.orphans.push(rel);
        }
    }

    Ok(report)
}
