use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use ceres_gate_kit::EventLog;
use ceres_gate_kit::Workspace;
use ceres_gate_kit::config::ConfigLoader;
use ceres_gate_kit::config::GateKitConfig;
use ceres_gate_kit::workspace::resolve_workspace;

/// Workspace and configuration shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub workspace: Workspace,
    pub config: GateKitConfig,
}

impl CommandContext {
    /// Resolve the workspace and load its configuration.
    ///
    /// An explicit `config` path must exist; otherwise `ceres.toml` in the
    /// workspace root is used when present.
    pub fn load(workspace: Option<&Path>, config: Option<&Path>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let workspace = resolve_workspace(workspace, &cwd)?;

        let loader = match config {
            Some(path) => ConfigLoader::new().with_file(path),
            None => ConfigLoader::new().with_workspace(workspace.root()),
        };
        let config = loader
            .load()
            .map_err(ceres_gate_kit::GateKitError::from)?;

        Ok(Self { workspace, config })
    }

    /// Workspace-relative path from the command line, or the configured default.
    pub fn path_or(&self, explicit: Option<&Path>, configured: &Path) -> PathBuf {
        self.workspace.resolve(explicit.unwrap_or(configured))
    }

    pub fn event_log(&self) -> EventLog {
        EventLog::new(self.workspace.resolve(&self.config.paths.events_log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_workspace_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let err = CommandContext::load(Some(&dir.path().join("absent")), None)
            .expect_err("workspace must exist");
        assert!(err.to_string().starts_with("Workspace not found"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempdir().expect("tempdir");
        let err = CommandContext::load(Some(dir.path()), Some(&dir.path().join("none.toml")))
            .expect_err("config must exist");
        assert!(err.to_string().contains("none.toml"));
    }

    #[test]
    fn paths_resolve_against_workspace() {
        let dir = tempdir().expect("tempdir");
        let ctx = CommandContext::load(Some(dir.path()), None).expect("load");
        assert_eq!(
            ctx.path_or(None, Path::new("todo.md")),
            dir.path().join("todo.md")
        );
        assert_eq!(
            ctx.path_or(Some(Path::new("other.md")), Path::new("todo.md")),
            dir.path().join("other.md")
        );
        assert_eq!(ctx.event_log().path(), dir.path().join("logs/events.jsonl"));
    }
}
