use std::path::PathBuf;

use ceres_gate_kit::settings::AutoSafeFlags;
use ceres_gate_kit::settings::SettingsResolver;
use ceres_gate_kit::settings::load_state;
use clap::Parser;

use crate::context::CommandContext;

/// Arguments for `ceres resolve`
#[derive(Debug, Parser)]
pub struct ResolveArgs {
    /// Settings document (defaults to the configured path)
    #[arg(long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// All blocking gaps are resolved (required for auto-safe)
    #[arg(long = "blocking-gaps-resolved")]
    pub blocking_gaps_resolved: bool,

    /// No open ClarificationRequest (required for auto-safe)
    #[arg(long = "no-open-clarifications")]
    pub no_open_clarifications: bool,

    /// Acceptance criteria are deterministic (required for auto-safe)
    #[arg(long = "deterministic-acceptance")]
    pub deterministic_acceptance: bool,
}

impl ResolveArgs {
    fn flags(&self) -> AutoSafeFlags {
        AutoSafeFlags {
            blocking_gaps_resolved: self.blocking_gaps_resolved,
            no_open_clarifications: self.no_open_clarifications,
            deterministic_acceptance: self.deterministic_acceptance,
        }
    }
}

/// Resolve, enforce, record, then print the resolution as JSON.
pub fn run_resolve(ctx: &CommandContext, args: &ResolveArgs) -> anyhow::Result<i32> {
    let path = ctx.path_or(args.settings.as_deref(), &ctx.config.paths.settings);
    let state = load_state(&path)?;

    let resolution = SettingsResolver::new(ctx.event_log()).resolve(&state, &args.flags())?;
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(0)
}
