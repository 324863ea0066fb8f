//! Settings resolution
//!
//! One effective configuration is computed from four precedence layers,
//! lowest to highest: system defaults, mode defaults, profile overrides,
//! session overrides. Last writer wins per key; there is no deep merge.

mod resolver;
mod state;

pub use resolver::{
    AutoSafeFlags, ILLEGAL_COMBINATIONS, IllegalCombinationRule, Resolution,
    SCHEMA_SETTINGS_KEYS, SettingsResolver, enforce_auto_safe_predicate,
    enforce_illegal_combinations, resolve,
};
pub use state::{DEFAULT_ACTIVE_MODE, ModeDefaults, Profile, SettingsState, load_state, save_state};
