// gm-content-tools/src/bin/capture_plan.rs

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use gm_content_tools::{capture_plan, init_tracing, CommandTemplate, ConfigManager, ScenarioId, WriteOutcome};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "capture-plan", version, about = "Generate automated perf capture plans.")]
struct Args {
    /// Limit capture generation to the specified preset(s). Can be repeated.
    #[arg(long = "preset", value_enum)]
    presets: Vec<ScenarioId>,
    /// Optional path to save the capture plan JSON.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print plan information without writing files.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    init_tracing("warn");
    let args = Args::parse();
    let cfg = ConfigManager::discover().context("resolve repository root")?;
    let template = CommandTemplate::from_config(&cfg);

    let (plan, written) = capture_plan::generate(&args.presets, args.output.as_deref(), args.dry_run, Utc::now(), &template)
        .context("generate capture plan")?;
    match written {
        Some(WriteOutcome::DryRun(path)) => println!("[dry-run] Would write plan to {}", path.display()),
        Some(WriteOutcome::Written(path)) => println!("Wrote perf capture plan to {}", path.display()),
        None => {}
    }

    println!("Perf capture plan: {}", plan.summary());
    println!("{}", plan.to_json_pretty()?);
    Ok(())
}
