//! Workspace root resolution
//!
//! Pure resolution lives in [`workspace_candidate`]; [`resolve_workspace`]
//! layers the environment read and the existence check on top. A missing
//! workspace is fatal for every caller.

use std::path::Path;
use std::path::PathBuf;

use crate::document::resolve_path;
use crate::error::GateKitError;
use crate::error::Result;

/// Environment variable naming the workspace root.
pub const WORKSPACE_ENV: &str = "CERES_WORKSPACE";

/// Workspace location used when the environment does not name one.
pub const DEFAULT_WORKSPACE: &str = ".ceres/workspace";

/// Compute the workspace path from an env value and the current directory.
pub fn workspace_candidate(env_value: Option<&str>, cwd: &Path) -> PathBuf {
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => resolve_path(cwd, value),
        None => cwd.join(DEFAULT_WORKSPACE),
    }
}

/// Resolve the workspace root: explicit path, then `CERES_WORKSPACE`, then
/// `<cwd>/.ceres/workspace`.
pub fn resolve_workspace(explicit: Option<&Path>, cwd: &Path) -> Result<Workspace> {
    let root = match explicit {
        Some(path) => resolve_path(cwd, path),
        None => {
            let env_value = std::env::var(WORKSPACE_ENV).ok();
            workspace_candidate(env_value.as_deref(), cwd)
        }
    };
    Workspace::open(root)
}

/// An existing workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open `root`, failing closed when it is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GateKitError::WorkspaceMissing { path: root });
        }
        tracing::debug!(root = %root.display(), "workspace resolved");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative path.
    pub fn resolve(&self, raw: impl AsRef<Path>) -> PathBuf {
        resolve_path(&self.root, raw)
    }
}
