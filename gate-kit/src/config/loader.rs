use crate::config::error::{ConfigError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional workspace-level config file.
pub const CONFIG_FILE_NAME: &str = "ceres.toml";

/// Root gate-kit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateKitConfig {
    /// Artifact locations, relative to the workspace root
    #[serde(default)]
    pub paths: PathsConfig,

    /// External collaborator command lines
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,

    /// Prompt hygiene rules
    #[serde(default)]
    pub prompt_hygiene: PromptHygieneConfig,

    /// Gate context defaults
    #[serde(default)]
    pub gate: GateDefaultsConfig,
}

/// Artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_settings_path")]
    pub settings: PathBuf,

    #[serde(default = "default_events_log")]
    pub events_log: PathBuf,

    #[serde(default = "default_policy_path")]
    pub policy: PathBuf,

    #[serde(default = "default_workflow_path")]
    pub workflow: PathBuf,

    /// Prompt artifact checked by the gate
    #[serde(default = "default_prompt_path")]
    pub prompt: PathBuf,

    /// Where the prompt debugger's report is written
    #[serde(default = "default_prompt_report_path")]
    pub prompt_report: PathBuf,

    /// Task Plan
    #[serde(default = "default_todo_path")]
    pub todo: PathBuf,

    #[serde(default = "default_gap_ledger_path")]
    pub gap_ledger: PathBuf,

    #[serde(default = "default_objective_path")]
    pub objective: PathBuf,

    /// Elicitation Record file, or a directory holding exactly one `.md`
    #[serde(default = "default_elicitation_path")]
    pub elicitation: PathBuf,

    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,
}

/// Collaborator command lines (shell words)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default = "default_prompt_debugger")]
    pub prompt_debugger: String,

    #[serde(default = "default_contract_validator")]
    pub contract_validator: String,

    #[serde(default = "default_lifecycle_enforcer")]
    pub lifecycle_enforcer: String,
}

/// Prompt hygiene rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptHygieneConfig {
    /// Prompt files exempt from orphan detection. Entries ending in `/`
    /// match as prefixes.
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,

    /// Subdirectory of the prompts directory holding completed prompts
    #[serde(default = "default_completed_dir")]
    pub completed_dir: String,
}

/// Defaults for gate context fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDefaultsConfig {
    #[serde(default = "default_agent")]
    pub agent: String,

    #[serde(default = "default_pattern")]
    pub pattern: String,
}

// Default value functions
fn default_settings_path() -> PathBuf {
    PathBuf::from("modes_settings_profiles.json")
}
fn default_events_log() -> PathBuf {
    PathBuf::from("logs/events.jsonl")
}
fn default_policy_path() -> PathBuf {
    PathBuf::from("ceres.policy.yaml")
}
fn default_workflow_path() -> PathBuf {
    PathBuf::from("ceres.workflow.yaml")
}
fn default_prompt_path() -> PathBuf {
    PathBuf::from("todo-inbox.md")
}
fn default_prompt_report_path() -> PathBuf {
    PathBuf::from("logs/prompt-debug-report.yaml")
}
fn default_todo_path() -> PathBuf {
    PathBuf::from("todo.md")
}
fn default_gap_ledger_path() -> PathBuf {
    PathBuf::from("gap-ledger.json")
}
fn default_objective_path() -> PathBuf {
    PathBuf::from("objective-contract.json")
}
fn default_elicitation_path() -> PathBuf {
    PathBuf::from("specs/elicitation")
}
fn default_prompts_dir() -> PathBuf {
    PathBuf::from("prompts")
}
fn default_prompt_debugger() -> String {
    "prompt-debugger/cli.py".to_string()
}
fn default_contract_validator() -> String {
    "scripts/validate-governance-contract.py".to_string()
}
fn default_lifecycle_enforcer() -> String {
    "scripts/enforce-lifecycle.py".to_string()
}
fn default_allowlist() -> Vec<String> {
    vec!["README.md".to_string(), "templates/".to_string()]
}
fn default_completed_dir() -> String {
    "completed".to_string()
}
fn default_agent() -> String {
    "operator".to_string()
}
fn default_pattern() -> String {
    "preflight".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings: default_settings_path(),
            events_log: default_events_log(),
            policy: default_policy_path(),
            workflow: default_workflow_path(),
            prompt: default_prompt_path(),
            prompt_report: default_prompt_report_path(),
            todo: default_todo_path(),
            gap_ledger: default_gap_ledger_path(),
            objective: default_objective_path(),
            elicitation: default_elicitation_path(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            prompt_debugger: default_prompt_debugger(),
            contract_validator: default_contract_validator(),
            lifecycle_enforcer: default_lifecycle_enforcer(),
        }
    }
}

impl Default for PromptHygieneConfig {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
            completed_dir: default_completed_dir(),
        }
    }
}

impl Default for GateDefaultsConfig {
    fn default() -> Self {
        Self {
            agent: default_agent(),
            pattern: default_pattern(),
        }
    }
}

impl GateKitConfig {
    /// Reject values the gate cannot work with.
    pub fn validate(&self) -> Result<()> {
        let commands = [
            ("collaborators.prompt_debugger", &self.collaborators.prompt_debugger),
            ("collaborators.contract_validator", &self.collaborators.contract_validator),
            ("collaborators.lifecycle_enforcer", &self.collaborators.lifecycle_enforcer),
        ];
        for (key, line) in commands {
            match shlex::split(line) {
                Some(words) if !words.is_empty() => {}
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "{key} must be a non-empty command line (got {line:?})"
                    )));
                }
            }
        }

        if self
            .prompt_hygiene
            .allowlist
            .iter()
            .any(|entry| entry.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "prompt_hygiene.allowlist entries must be non-empty".to_string(),
            ));
        }

        if self.prompt_hygiene.completed_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prompt_hygiene.completed_dir must be non-empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loader with layered merging support
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    optional: bool,
}

impl ConfigLoader {
    /// Create a new ConfigLoader
    pub fn new() -> Self {
        Self {
            config_path: None,
            optional: false,
        }
    }

    /// Set the configuration file path. The file must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self.optional = false;
        self
    }

    /// Use `ceres.toml` from the workspace root when it exists.
    pub fn with_workspace<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.config_path = Some(root.as_ref().join(CONFIG_FILE_NAME));
        self.optional = true;
        self
    }

    /// Load configuration with layered merging:
    /// 1. Start with defaults (from Default implementations)
    /// 2. Merge config file if provided
    /// 3. Override with environment variables (CERES_ prefix)
    pub fn load(&self) -> Result<GateKitConfig> {
        let mut builder = Config::builder();

        // Layer 1: Defaults (serialize defaults to JSON and load as base)
        let defaults_json = serde_json::to_string(&GateKitConfig::default())?;
        builder = builder.add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Layer 2: Config file
        if let Some(ref path) = self.config_path {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config file");
                builder = builder.add_source(File::from(path.as_ref()));
            } else if !self.optional {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        }

        // Layer 3: Environment variables, double underscore for nesting
        // Example: CERES_PATHS__EVENTS_LOG=logs/audit.jsonl
        builder = builder.add_source(
            Environment::with_prefix("CERES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let gate_config: GateKitConfig = config.try_deserialize()?;
        gate_config.validate()?;

        Ok(gate_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
