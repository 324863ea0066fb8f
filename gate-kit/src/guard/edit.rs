use std::fs;
use std::path::Path;

use crate::error::GateKitError;
use crate::error::Result;

/// Seed `proposed` with a copy of `current` when it does not exist yet.
///
/// Returns whether the file was created.
pub fn ensure_proposed(current: &Path, proposed: &Path) -> Result<bool> {
    if proposed.exists() {
        return Ok(false);
    }
    if !current.exists() {
        return Err(GateKitError::ConfigNotFound {
            path: current.to_path_buf(),
        });
    }
    if let Some(parent) = proposed.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GateKitError::io(parent, e))?;
    }
    fs::copy(current, proposed).map_err(|e| GateKitError::io(proposed, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_copy_once() {
        let dir = tempdir().expect("tempdir");
        let current = dir.path().join("ceres.policy.yaml");
        let proposed = dir.path().join("drafts/ceres.policy.proposed.yaml");
        fs::write(&current, "version: 1\n").expect("write");

        assert!(ensure_proposed(&current, &proposed).expect("first"));
        fs::write(&proposed, "version: 2\n").expect("edit");
        assert!(!ensure_proposed(&current, &proposed).expect("second"));
        assert_eq!(fs::read_to_string(&proposed).expect("read"), "version: 2\n");
    }

    #[test]
    fn missing_current_is_config_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = ensure_proposed(&dir.path().join("a.yaml"), &dir.path().join("b.yaml"))
            .unwrap_err();
        assert!(matches!(err, GateKitError::ConfigNotFound { .. }));
    }
}
