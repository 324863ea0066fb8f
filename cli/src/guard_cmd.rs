//! `ceres policy` / `ceres workflow`: guarded config change
//!
//! `guard` validates a proposed document against the live one and applies
//! it on request. `edit` first seeds the proposed copy from the live
//! document, optionally opens it in an editor, then runs the same guard.

use std::path::Path;
use std::path::PathBuf;

use ceres_gate_kit::guard::GuardKind;
use ceres_gate_kit::guard::GuardOutcome;
use ceres_gate_kit::guard::GuardRequest;
use ceres_gate_kit::guard::GuardRun;
use ceres_gate_kit::guard::ensure_proposed;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::console::ConsoleConfirmer;
use crate::console::open_in_editor;
use crate::context::CommandContext;

#[derive(Debug, Parser)]
pub struct GuardCli {
    #[command(subcommand)]
    pub command: GuardSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum GuardSubcommand {
    /// Validate a proposed document, show warnings and diffs, apply on request
    Guard(GuardArgs),

    /// Seed, optionally open, and guard the proposed copy
    Edit(EditArgs),
}

/// Flags shared by `guard` and `edit`
#[derive(Debug, Clone, Args)]
pub struct GuardArgs {
    /// Live document (defaults to the configured path)
    #[arg(long = "current", value_name = "PATH")]
    pub current: Option<PathBuf>,

    /// Proposed document (guard: defaults to --current; edit: to the proposed copy)
    #[arg(long = "proposed", value_name = "PATH")]
    pub proposed: Option<PathBuf>,

    /// Copy the proposed document over the live one
    #[arg(long = "apply")]
    pub apply: bool,

    /// Accept warnings without prompting
    #[arg(long = "confirm")]
    pub confirm: bool,

    /// Treat warnings as failure (exit 2)
    #[arg(long = "fail-on-warning")]
    pub fail_on_warning: bool,

    /// Output as JSON instead of text
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub guard: GuardArgs,

    /// Open the proposed copy in $EDITOR before validating
    #[arg(long = "open")]
    pub open: bool,

    /// Editor command overriding $EDITOR
    #[arg(long = "editor", value_name = "CMD")]
    pub editor: Option<String>,
}

pub fn run_guard_cli(ctx: &CommandContext, kind: GuardKind, cli: GuardCli) -> anyhow::Result<i32> {
    match cli.command {
        GuardSubcommand::Guard(args) => {
            let request = build_request(ctx, kind, &args, None);
            run_and_report(kind, &request, args.json)
        }
        GuardSubcommand::Edit(args) => run_edit(ctx, kind, &args),
    }
}

fn run_edit(ctx: &CommandContext, kind: GuardKind, args: &EditArgs) -> anyhow::Result<i32> {
    let request = build_request(ctx, kind, &args.guard, Some(Path::new(kind.default_proposed())));
    let proposed = request.proposed_path().clone();
    let json = args.guard.json;

    if ensure_proposed(&request.current, &proposed)? {
        notice(json, &format!("Created proposed {}: {}", kind.label(), proposed.display()));
    }

    if args.open {
        open_in_editor(&proposed, args.editor.as_deref())?;
    }

    let code = run_and_report(kind, &request, json)?;

    if !args.guard.apply {
        notice(
            json,
            &format!(
                "Review proposed {} and re-run with --apply to commit changes.",
                kind.label()
            ),
        );
    }
    Ok(code)
}

fn build_request(
    ctx: &CommandContext,
    kind: GuardKind,
    args: &GuardArgs,
    default_proposed: Option<&Path>,
) -> GuardRequest {
    let configured = match kind {
        GuardKind::Policy => &ctx.config.paths.policy,
        GuardKind::Workflow => &ctx.config.paths.workflow,
    };
    let current = ctx.path_or(args.current.as_deref(), configured);
    let proposed = args
        .proposed
        .as_deref()
        .or(default_proposed)
        .map(|p| ctx.workspace.resolve(p));

    GuardRequest {
        current,
        proposed,
        apply: args.apply,
        confirm: args.confirm,
        fail_on_warning: args.fail_on_warning,
    }
}

fn run_and_report(kind: GuardKind, request: &GuardRequest, json: bool) -> anyhow::Result<i32> {
    let run = kind.run_guard(request, &ConsoleConfirmer)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run.report)?);
    } else {
        print_text(&run);
    }

    match run.outcome {
        GuardOutcome::Declined => notice(json, "Change not applied."),
        GuardOutcome::Applied => notice(
            json,
            &format!("Applied {} to {}", kind.label(), run.current.display()),
        ),
        GuardOutcome::Checked | GuardOutcome::Invalid | GuardOutcome::WarningsRejected => {}
    }
    Ok(run.outcome.exit_code())
}

fn print_text(run: &GuardRun) {
    let report = &run.report;
    if !report.errors.is_empty() {
        eprintln!("Errors:");
        for error in &report.errors {
            eprintln!("- {error}");
        }
    }
    if !report.diffs.is_empty() {
        println!("Proposed changes:");
        for diff in &report.diffs {
            println!("- {diff}");
        }
    }
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("- {warning}");
        }
    }
}

/// Status line: stdout for text output, stderr when stdout carries JSON.
fn notice(json: bool, message: &str) {
    if json {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}
