use std::path::PathBuf;

use ceres_gate_kit::GateContext;
use ceres_gate_kit::GateMode;
use ceres_gate_kit::gate::Collaborators;
use ceres_gate_kit::gate::GateInputs;
use ceres_gate_kit::gate::GatePipeline;
use ceres_gate_kit::gate::GateRun;
use ceres_gate_kit::gate::GateVerdict;
use clap::Parser;

use crate::context::CommandContext;

/// Arguments for `ceres preflight`
#[derive(Debug, Parser)]
pub struct PreflightArgs {
    /// Action being admitted: plan or execute
    #[arg(long = "mode", value_name = "MODE", default_value = "execute")]
    pub mode: GateMode,

    /// Prompt inbox file
    #[arg(long = "prompt", value_name = "PATH")]
    pub prompt: Option<PathBuf>,

    /// Where the prompt debugger writes its report
    #[arg(long = "prompt-report", value_name = "PATH")]
    pub prompt_report: Option<PathBuf>,

    /// Task Plan
    #[arg(long = "todo", value_name = "PATH")]
    pub todo: Option<PathBuf>,

    #[arg(long = "gap-ledger", value_name = "PATH")]
    pub gap_ledger: Option<PathBuf>,

    #[arg(long = "objective", value_name = "PATH")]
    pub objective: Option<PathBuf>,

    /// Elicitation record, or a directory holding exactly one
    #[arg(long = "elicitation", value_name = "PATH")]
    pub elicitation: Option<PathBuf>,

    #[arg(long = "prompts-dir", value_name = "DIR")]
    pub prompts_dir: Option<PathBuf>,

    #[arg(long = "task-id", value_name = "ID")]
    pub task_id: Option<String>,

    #[arg(long = "task-class", value_name = "CLASS")]
    pub task_class: Option<String>,

    /// Lifecycle phase (defaults to the mode)
    #[arg(long = "phase", value_name = "PHASE")]
    pub phase: Option<String>,

    #[arg(long = "agent", value_name = "NAME")]
    pub agent: Option<String>,

    #[arg(long = "pattern", value_name = "NAME")]
    pub pattern: Option<String>,
}

impl PreflightArgs {
    fn inputs(&self, ctx: &CommandContext) -> GateInputs {
        let mut inputs = GateInputs::from_config(&ctx.workspace, &ctx.config);
        let overrides = [
            (&self.prompt, &mut inputs.prompt),
            (&self.prompt_report, &mut inputs.prompt_report),
            (&self.todo, &mut inputs.todo),
            (&self.gap_ledger, &mut inputs.gap_ledger),
            (&self.objective, &mut inputs.objective),
            (&self.elicitation, &mut inputs.elicitation),
            (&self.prompts_dir, &mut inputs.prompts_dir),
        ];
        for (explicit, slot) in overrides {
            if let Some(path) = explicit {
                *slot = ctx.workspace.resolve(path);
            }
        }
        inputs
    }

    fn context(&self, ctx: &CommandContext) -> GateContext {
        let defaults = &ctx.config.gate;
        let agent = self.agent.as_deref().unwrap_or(&defaults.agent);
        let pattern = self.pattern.as_deref().unwrap_or(&defaults.pattern);

        let mut context = GateContext::new(self.mode, agent, pattern)
            .with_task_id(self.task_id.clone())
            .with_task_class(self.task_class.clone());
        if let Some(phase) = &self.phase {
            context = context.with_phase(phase.as_str());
        }
        context
    }
}

/// Run the standard gate with the configured collaborators.
pub fn run_preflight(ctx: &CommandContext, args: PreflightArgs) -> anyhow::Result<i32> {
    let inputs = args.inputs(ctx);
    let mut run = GateRun::new(args.context(ctx), inputs);

    let collaborators = Collaborators::external(&ctx.workspace, &ctx.config.collaborators)?;
    let pipeline = GatePipeline::standard(ctx.event_log(), collaborators);

    match pipeline.run(&mut run)? {
        GateVerdict::Passed { .. } => {
            println!("Preflight checks passed ({} mode).", args.mode);
            Ok(0)
        }
        GateVerdict::Failed(failure) => {
            eprintln!("Preflight failed at {}: {}", failure.stage, failure.reason);
            Ok(failure.exit_code)
        }
    }
}
