use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::state::SettingsState;
use crate::error::GateKitError;
use crate::error::Result;
use crate::events::EventLog;
use crate::events::ResolutionEvent;

/// Keys that make up the effective settings. Anything else in a layer is
/// ignored.
pub const SCHEMA_SETTINGS_KEYS: [&str; 7] = [
    "execution_continuity",
    "autonomy_level",
    "questioning_policy",
    "output_density",
    "failure_handling",
    "progress_signaling",
    "safety_level",
];

/// A forbidden `(mode, key = value)` pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalCombinationRule {
    pub mode: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub message: &'static str,
}

/// Closed rule set, evaluated against the fully resolved mode.
pub const ILLEGAL_COMBINATIONS: &[IllegalCombinationRule] = &[IllegalCombinationRule {
    mode: "professional",
    key: "execution_continuity",
    value: "continuous",
    message: "professional mode cannot run with execution_continuity=continuous.",
}];

/// Externally supplied preconditions for auto-safe execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSafeFlags {
    pub blocking_gaps_resolved: bool,
    pub no_open_clarifications: bool,
    pub deterministic_acceptance: bool,
}

impl AutoSafeFlags {
    pub fn all_met() -> Self {
        Self {
            blocking_gaps_resolved: true,
            no_open_clarifications: true,
            deterministic_acceptance: true,
        }
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub active_mode: String,
    pub active_profile: Option<String>,
    pub effective_settings: Map<String, Value>,
}

/// Compute the effective settings of `state`.
///
/// An active profile's `base_mode` replaces the stored mode before the
/// mode-default layer is selected. An unknown profile is fatal.
pub fn resolve(state: &SettingsState) -> Result<Resolution> {
    let mut active_mode = state.active_mode.clone();
    let active_profile = state.active_profile_name().map(str::to_string);

    let profile_overrides = match active_profile.as_deref() {
        Some(name) => {
            let profile = state.profile(name).ok_or_else(|| GateKitError::ProfileNotFound {
                name: name.to_string(),
            })?;
            if let Some(base_mode) = profile.base_mode.as_deref().filter(|m| !m.is_empty()) {
                if base_mode != active_mode {
                    tracing::debug!(
                        profile = name,
                        from = %active_mode,
                        to = base_mode,
                        "profile switches active mode"
                    );
                }
                active_mode = base_mode.to_string();
            }
            Some(&profile.overrides)
        }
        None => None,
    };

    let layers = [
        Some(&state.system_defaults),
        state.mode_settings(&active_mode),
        profile_overrides,
        Some(&state.session_overrides),
    ];

    let mut effective = Map::new();
    for key in SCHEMA_SETTINGS_KEYS {
        for layer in layers.iter().flatten() {
            if let Some(value) = layer.get(key) {
                effective.insert(key.to_string(), value.clone());
            }
        }
    }

    Ok(Resolution {
        active_mode,
        active_profile,
        effective_settings: effective,
    })
}

/// Reject forbidden mode/setting pairs.
pub fn enforce_illegal_combinations(mode: &str, effective: &Map<String, Value>) -> Result<()> {
    for rule in ILLEGAL_COMBINATIONS {
        let hit = rule.mode == mode
            && effective.get(rule.key).and_then(Value::as_str) == Some(rule.value);
        if hit {
            return Err(GateKitError::IllegalCombination {
                mode: mode.to_string(),
                message: rule.message.to_string(),
            });
        }
    }
    Ok(())
}

/// Gate `execution_continuity = auto-safe` behind its preconditions.
///
/// Every unmet condition is reported; `safety_level = maximal` blocks even
/// when all flags hold.
pub fn enforce_auto_safe_predicate(flags: &AutoSafeFlags, effective: &Map<String, Value>) -> Result<()> {
    if effective.get("execution_continuity").and_then(Value::as_str) != Some("auto-safe") {
        return Ok(());
    }

    let mut reasons = Vec::new();
    if effective.get("safety_level").and_then(Value::as_str) == Some("maximal") {
        reasons.push("safety_level=maximal".to_string());
    }
    if !flags.blocking_gaps_resolved {
        reasons.push("blocking gaps unresolved".to_string());
    }
    if !flags.no_open_clarifications {
        reasons.push("open ClarificationRequest".to_string());
    }
    if !flags.deterministic_acceptance {
        reasons.push("acceptance criteria not deterministic".to_string());
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(GateKitError::AutoSafeBlocked { reasons })
    }
}

/// Resolves settings, enforces the rules and records every successful
/// resolution in the event log.
pub struct SettingsResolver {
    events: EventLog,
}

impl SettingsResolver {
    /// `source` recorded on resolution events.
    pub const SOURCE: &'static str = "ceres resolve";

    pub fn new(events: EventLog) -> Self {
        Self { events }
    }

    /// Resolve, enforce, then append one `mode_profile_resolved` event.
    ///
    /// Every call records a fresh event, even when the result matches the
    /// previous resolution.
    pub fn resolve(&self, state: &SettingsState, flags: &AutoSafeFlags) -> Result<Resolution> {
        let resolution = resolve(state)?;
        enforce_illegal_combinations(&resolution.active_mode, &resolution.effective_settings)?;
        enforce_auto_safe_predicate(flags, &resolution.effective_settings)?;

        let event = ResolutionEvent::new(
            &resolution.active_mode,
            resolution.active_profile.as_deref(),
            Value::Object(resolution.effective_settings.clone()),
            Self::SOURCE,
        );
        self.events.append(&event)?;

        tracing::info!(
            active_mode = %resolution.active_mode,
            active_profile = ?resolution.active_profile,
            "settings resolved"
        );
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state(value: Value) -> SettingsState {
        serde_json::from_value(value).expect("valid settings state")
    }

    #[test]
    fn session_overrides_beat_mode_defaults() {
        let state = state(json!({
            "active_mode": "guided",
            "system_defaults": {"safety_level": "standard"},
            "mode_defaults": [{"mode": "guided", "settings": {"execution_continuity": "manual"}}],
            "session_overrides": {"execution_continuity": "auto-safe"}
        }));

        let resolution = resolve(&state).expect("resolve");
        assert_eq!(resolution.effective_settings["execution_continuity"], "auto-safe");
        assert_eq!(resolution.effective_settings["safety_level"], "standard");
    }

    #[test]
    fn non_schema_keys_are_dropped() {
        let state = state(json!({
            "system_defaults": {"safety_level": "standard", "theme": "dark"}
        }));
        let resolution = resolve(&state).expect("resolve");
        assert!(resolution.effective_settings.get("theme").is_none());
    }

    #[test]
    fn profile_base_mode_selects_mode_layer() {
        let state = state(json!({
            "active_mode": "guided",
            "active_profile": "pro",
            "mode_defaults": [
                {"mode": "guided", "settings": {"output_density": "verbose"}},
                {"mode": "professional", "settings": {"output_density": "terse"}}
            ],
            "profiles": [{"name": "pro", "base_mode": "professional", "overrides": {}}]
        }));

        let resolution = resolve(&state).expect("resolve");
        assert_eq!(resolution.active_mode, "professional");
        assert_eq!(resolution.active_profile.as_deref(), Some("pro"));
        assert_eq!(resolution.effective_settings["output_density"], "terse");
    }

    #[test]
    fn profile_without_base_mode_keeps_mode() {
        let state = state(json!({
            "active_mode": "guided",
            "active_profile": "quiet",
            "profiles": [{"name": "quiet", "overrides": {"output_density": "terse"}}]
        }));
        let resolution = resolve(&state).expect("resolve");
        assert_eq!(resolution.active_mode, "guided");
        assert_eq!(resolution.effective_settings["output_density"], "terse");
    }

    #[test]
    fn unknown_profile_is_fatal() {
        let state = state(json!({"active_profile": "ghost"}));
        let err = resolve(&state).unwrap_err();
        assert!(matches!(err, GateKitError::ProfileNotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn professional_continuous_is_illegal() {
        let mut effective = Map::new();
        effective.insert("execution_continuity".into(), json!("continuous"));
        let err = enforce_illegal_combinations("professional", &effective).unwrap_err();
        assert!(err.to_string().contains("professional mode cannot run"));
        assert!(enforce_illegal_combinations("guided", &effective).is_ok());
    }

    #[test]
    fn predicate_ignores_other_continuity_modes() {
        let mut effective = Map::new();
        effective.insert("execution_continuity".into(), json!("manual"));
        effective.insert("safety_level".into(), json!("maximal"));
        assert!(enforce_auto_safe_predicate(&AutoSafeFlags::default(), &effective).is_ok());
    }
}
