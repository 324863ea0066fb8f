use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::document::load_json;
use crate::error::GateKitError;
use crate::error::Result;

/// Mode used when the settings document does not name one.
pub const DEFAULT_ACTIVE_MODE: &str = "guided";

/// The persisted settings document.
///
/// Unknown top-level fields are kept in `extra` so a rewrite does not drop
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsState {
    #[serde(default = "default_active_mode")]
    pub active_mode: String,

    #[serde(default)]
    pub active_profile: Option<String>,

    #[serde(default)]
    pub system_defaults: Map<String, Value>,

    #[serde(default)]
    pub mode_defaults: Vec<ModeDefaults>,

    #[serde(default)]
    pub profiles: Vec<Profile>,

    #[serde(default)]
    pub session_overrides: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settings applied when `mode` is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDefaults {
    pub mode: String,

    #[serde(default)]
    pub settings: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named override set. A `base_mode` switches the active mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    #[serde(default)]
    pub base_mode: Option<String>,

    #[serde(default)]
    pub overrides: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active_mode() -> String {
    DEFAULT_ACTIVE_MODE.to_string()
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            active_mode: default_active_mode(),
            active_profile: None,
            system_defaults: Map::new(),
            mode_defaults: Vec::new(),
            profiles: Vec::new(),
            session_overrides: Map::new(),
            extra: Map::new(),
        }
    }
}

impl SettingsState {
    /// Settings for `mode`, empty when the mode has no entry.
    pub fn mode_settings(&self, mode: &str) -> Option<&Map<String, Value>> {
        self.mode_defaults
            .iter()
            .find(|entry| entry.mode == mode)
            .map(|entry| &entry.settings)
    }

    /// Active profile name, treating an empty string as none.
    pub fn active_profile_name(&self) -> Option<&str> {
        self.active_profile
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}

/// Load the settings document. Missing is `ConfigNotFound`, malformed is
/// `Parse`.
pub fn load_state(path: &Path) -> Result<SettingsState> {
    let value = load_json(path, "settings")?;
    serde_json::from_value(value).map_err(|e| GateKitError::Parse {
        label: "settings".to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Rewrite the settings document as pretty JSON.
pub fn save_state(path: &Path, state: &SettingsState) -> Result<()> {
    let mut content = serde_json::to_string_pretty(state)
        .map_err(|e| GateKitError::io(path, std::io::Error::from(e)))?;
    content.push('\n');
    fs::write(path, content).map_err(|e| GateKitError::io(path, e))
}
