//! CERES command line
//!
//! Thin adapter over `ceres-gate-kit`: parses arguments, loads the
//! workspace and configuration, runs one governance operation and maps its
//! outcome to a process exit code.
//!
//! ## Commands
//!
//! - `ceres resolve [--settings PATH] [--blocking-gaps-resolved] ...`
//! - `ceres policy guard|edit [--proposed PATH] [--apply] [--confirm] [--json]`
//! - `ceres workflow guard|edit [--proposed PATH] [--apply] [--confirm] [--json]`
//! - `ceres preflight --mode <plan|execute> [artifact overrides]`
//! - `ceres log-event --type T --status S --message M [--context JSON]`
//! - `ceres auto-governance`
//!
//! ## Exit Codes
//!
//! - 0: Success
//! - 1: Validation or business-rule failure
//! - 2: Warnings treated as failure (`--fail-on-warning`)
//! - 3: Confirmation declined
//! - 127: A required external command is missing

mod console;
mod context;
mod governance_cmd;
mod guard_cmd;
mod log_event_cmd;
mod preflight_cmd;
mod resolve_cmd;

use std::path::PathBuf;

use ceres_gate_kit::GateKitError;
use ceres_gate_kit::error::exit_codes;
use ceres_gate_kit::guard::GuardKind;
use clap::Parser;
use clap::Subcommand;

pub use context::CommandContext;
pub use guard_cmd::GuardCli;
pub use log_event_cmd::LogEventArgs;
pub use preflight_cmd::PreflightArgs;
pub use resolve_cmd::ResolveArgs;

/// CERES governance control plane
#[derive(Debug, Parser)]
#[command(name = "ceres", version)]
pub struct Cli {
    /// Workspace root (defaults to $CERES_WORKSPACE, then ./.ceres/workspace)
    #[arg(long = "workspace", short = 'w', value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// Configuration file (defaults to ceres.toml in the workspace root)
    #[arg(long = "config", short = 'c', value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the effective settings and record the resolution
    Resolve(ResolveArgs),

    /// Validate and apply a proposed policy
    Policy(GuardCli),

    /// Validate and apply a proposed workflow config
    Workflow(GuardCli),

    /// Run the preflight gate for a plan or execute action
    Preflight(PreflightArgs),

    /// Append an audit event to the event log
    LogEvent(LogEventArgs),

    /// Detect governance issues and select the strict or fast preset
    AutoGovernance,
}

/// Run one command and return its exit code.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    // log-event writes to an explicit file and needs no workspace.
    if let Command::LogEvent(args) = &cli.command
        && args.out.is_some()
    {
        return log_event_cmd::run_log_event(None, args);
    }

    let ctx = CommandContext::load(cli.workspace.as_deref(), cli.config.as_deref())?;
    match cli.command {
        Command::Resolve(args) => resolve_cmd::run_resolve(&ctx, &args),
        Command::Policy(args) => guard_cmd::run_guard_cli(&ctx, GuardKind::Policy, args),
        Command::Workflow(args) => guard_cmd::run_guard_cli(&ctx, GuardKind::Workflow, args),
        Command::Preflight(args) => preflight_cmd::run_preflight(&ctx, args),
        Command::LogEvent(args) => log_event_cmd::run_log_event(Some(&ctx), &args),
        Command::AutoGovernance => governance_cmd::run_auto_governance(&ctx),
    }
}

/// Exit code for an error that escaped a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<GateKitError>()
        .map_or(exit_codes::FAILURE, GateKitError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_tool_maps_to_127() {
        let err = anyhow::Error::from(GateKitError::ExternalToolMissing {
            program: "prompt-debugger".to_string(),
        });
        assert_eq!(exit_code_for(&err), 127);
    }

    #[test]
    fn foreign_errors_map_to_failure() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn global_workspace_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["ceres", "preflight", "--mode", "plan", "-w", "/tmp/ws"])
            .expect("parse");
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
        assert!(matches!(cli.command, Command::Preflight(_)));
    }
}
