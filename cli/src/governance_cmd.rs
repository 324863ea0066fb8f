use ceres_gate_kit::gate::GateInputs;
use ceres_gate_kit::governance::run_auto_governance as apply_auto_governance;

use crate::context::CommandContext;

/// Select the strict or fast preset from workspace health. Always exits 0.
pub fn run_auto_governance(ctx: &CommandContext) -> anyhow::Result<i32> {
    let settings = ctx.workspace.resolve(&ctx.config.paths.settings);
    let inputs = GateInputs::from_config(&ctx.workspace, &ctx.config);

    match apply_auto_governance(&settings, &inputs, &ctx.event_log())? {
        None => println!("No settings document at {}; nothing to do.", settings.display()),
        Some(report) if report.strict => {
            println!("Applied strict preset. Issues:");
            for issue in &report.issues {
                println!("- {issue}");
            }
        }
        Some(_) => println!("Applied fast preset. No issues detected."),
    }
    Ok(0)
}
