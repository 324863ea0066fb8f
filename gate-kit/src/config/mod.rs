/// Configuration module for the gate kit
///
/// Layered configuration, lowest to highest precedence:
/// 1. Defaults (from code)
/// 2. Config file (`ceres.toml` in the workspace root, or an explicit path)
/// 3. Environment variables (`CERES_*` prefix, `__` for nesting)
///
/// # Example
///
/// ```no_run
/// use ceres_gate_kit::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_file("./ceres.toml")
///     .load()
///     .expect("Failed to load config");
/// ```
pub mod error;
pub mod loader;

pub use error::ConfigError;
pub use loader::{
    CONFIG_FILE_NAME, CollaboratorsConfig, ConfigLoader, GateDefaultsConfig, GateKitConfig,
    PathsConfig, PromptHygieneConfig,
};
