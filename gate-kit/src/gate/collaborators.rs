//! Boundary to the external governance tools
//!
//! The gate only sees the traits below. The default implementations run
//! configured command lines synchronously; tests substitute in-process
//! stubs.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use super::pipeline::GateInputs;
use crate::config::CollaboratorsConfig;
use crate::config::ConfigError;
use crate::document::load_yaml_or_json;
use crate::error::GateKitError;
use crate::error::Result;
use crate::types::GateContext;
use crate::workspace::Workspace;

/// Parsed output of the prompt debugger.
///
/// Only `status` decides admission. The other fields are informational and
/// read leniently: null lists are empty, non-string scalars are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptReport {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub detected_intent: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub suggested_fix: Vec<String>,
}

impl PromptReport {
    pub const LABEL: &'static str = "Prompt Debug Report";

    pub fn load(path: &Path) -> Result<Self> {
        let doc = load_yaml_or_json(path, Self::LABEL)?;
        serde_json::from_value(doc).map_err(|e| GateKitError::Parse {
            label: Self::LABEL.to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn is_approved(&self) -> bool {
        self.status.as_ref().and_then(Value::as_str) == Some("approved")
    }

    /// Status as shown to the operator; `null` when absent.
    pub fn status_text(&self) -> String {
        self.status.as_ref().map_or_else(|| "null".to_string(), render_scalar)
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(render_scalar))
}

fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(render_scalar).collect(),
        Some(other) => vec![render_scalar(&other)],
    })
}

/// Classifies a prompt and produces a [`PromptReport`].
pub trait PromptDebugger {
    /// Debug `prompt`, leaving the report at `report_path`.
    fn debug(&self, prompt: &Path, report_path: &Path) -> Result<PromptReport>;
}

/// What a governance check gets to see.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    pub context: &'a GateContext,
    pub inputs: &'a GateInputs,
}

/// Contract validator or lifecycle enforcer. Pass or fail only.
pub trait GovernanceCheck {
    fn name(&self) -> &str;

    fn check(&self, request: &CheckRequest<'_>) -> Result<()>;
}

// === External commands ===

/// A configured command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ExternalCommand {
    /// Split `line` into words. A relative program containing a path
    /// separator resolves against the workspace root; a bare name is looked
    /// up on `PATH`.
    pub fn parse(line: &str, workspace: &Workspace) -> Result<Self> {
        let words = shlex::split(line).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "collaborator command is not a valid command line (got {line:?})"
            ))
        })?;
        let Some((program, args)) = words.split_first() else {
            return Err(ConfigError::ValidationError(format!(
                "collaborator command must be a non-empty command line (got {line:?})"
            ))
            .into());
        };

        let program_path = PathBuf::from(program);
        let program = if program.contains('/') && program_path.is_relative() {
            workspace.resolve(&program_path)
        } else {
            program_path
        };

        Ok(Self {
            program,
            args: args.to_vec(),
            cwd: workspace.root().to_path_buf(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Run with `extra` arguments; success means exit status 0.
    pub fn run(&self, extra: &[OsString], stdout: Option<File>) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).args(extra).current_dir(&self.cwd);
        if let Some(file) = stdout {
            command.stdout(Stdio::from(file));
        }

        tracing::debug!(program = %self.program.display(), args = ?extra, "running collaborator");
        let status = command.status().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GateKitError::ExternalToolMissing {
                    program: self.program_name(),
                }
            } else {
                GateKitError::io(&self.program, e)
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(GateKitError::ExternalToolFailed {
                program: self.program_name(),
                exit_code: status.code(),
            })
        }
    }
}

/// Prompt debugger run as `<command> --prompt-file <prompt>`, stdout
/// captured into the report file.
pub struct ExternalPromptDebugger {
    command: ExternalCommand,
}

impl ExternalPromptDebugger {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl PromptDebugger for ExternalPromptDebugger {
    fn debug(&self, prompt: &Path, report_path: &Path) -> Result<PromptReport> {
        if let Some(parent) = report_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| GateKitError::io(parent, e))?;
        }
        let report_file = File::create(report_path).map_err(|e| GateKitError::io(report_path, e))?;

        let extra = vec![OsString::from("--prompt-file"), prompt.as_os_str().to_owned()];
        self.command.run(&extra, Some(report_file))?;
        PromptReport::load(report_path)
    }
}

/// Which artifact arguments a check receives before the context arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CheckArgs {
    ContextOnly,
    WithArtifacts,
}

/// Governance check run as an external command; exit code decides.
pub struct ExternalGovernanceCheck {
    name: String,
    command: ExternalCommand,
    args: CheckArgs,
}

impl ExternalGovernanceCheck {
    pub fn contract_validator(command: ExternalCommand) -> Self {
        Self {
            name: "contract validator".to_string(),
            command,
            args: CheckArgs::ContextOnly,
        }
    }

    pub fn lifecycle_enforcer(command: ExternalCommand) -> Self {
        Self {
            name: "lifecycle enforcer".to_string(),
            command,
            args: CheckArgs::WithArtifacts,
        }
    }

    /// Arguments passed for `request`.
    pub fn arguments(&self, request: &CheckRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |flag: &str, value: &OsStr| {
            args.push(flag.into());
            args.push(value.to_owned());
        };

        if self.args == CheckArgs::WithArtifacts {
            push("--todo", request.inputs.todo.as_os_str());
            push("--gap-ledger", request.inputs.gap_ledger.as_os_str());
            push("--prompt-report", request.inputs.prompt_report.as_os_str());
        }

        let ctx = request.context;
        push("--phase", OsStr::new(&ctx.phase));
        push("--agent", OsStr::new(&ctx.agent));
        push("--pattern", OsStr::new(&ctx.pattern));
        if let Some(task_class) = &ctx.task_class {
            push("--task-class", OsStr::new(task_class));
        }
        if let Some(task_id) = &ctx.task_id {
            push("--task-id", OsStr::new(task_id));
        }
        if let Some(spec_id) = &ctx.spec_id {
            push("--spec-id", OsStr::new(spec_id));
        }
        push("--events-path", request.inputs.events_log.as_os_str());
        args
    }
}

impl GovernanceCheck for ExternalGovernanceCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, request: &CheckRequest<'_>) -> Result<()> {
        self.command.run(&self.arguments(request), None)
    }
}

/// The collaborator set a standard pipeline delegates to.
pub struct Collaborators {
    pub prompt_debugger: Box<dyn PromptDebugger>,
    pub contract_validator: Box<dyn GovernanceCheck>,
    pub lifecycle_enforcer: Box<dyn GovernanceCheck>,
}

impl Collaborators {
    /// External commands from configuration.
    pub fn external(workspace: &Workspace, config: &CollaboratorsConfig) -> Result<Self> {
        Ok(Self {
            prompt_debugger: Box::new(ExternalPromptDebugger::new(ExternalCommand::parse(
                &config.prompt_debugger,
                workspace,
            )?)),
            contract_validator: Box::new(ExternalGovernanceCheck::contract_validator(
                ExternalCommand::parse(&config.contract_validator, workspace)?,
            )),
            lifecycle_enforcer: Box::new(ExternalGovernanceCheck::lifecycle_enforcer(
                ExternalCommand::parse(&config.lifecycle_enforcer, workspace)?,
            )),
        })
    }
}
