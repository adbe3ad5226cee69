use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gm_content_tools::{content, ConfigManager, ContentPaths, Scope, SchemaRegistry, ValidationOutcome};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask", about = "Content tools workspace tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate every content bucket; strict variant: fails on any outcome but AllValid
    ValidateContent,
    /// Validate one file against assets/content/schemas/<bucket>.schema.json
    ValidateFile { bucket: String, file: PathBuf },
    /// Print the merged tool config and where it was read from
    ShowConfig,
}

fn main() -> Result<()> {
    gm_content_tools::init_tracing("warn");
    let cli = Cli::parse();
    let cfg = ConfigManager::discover().context("resolve repository root")?;
    match cli.cmd {
        Cmd::ValidateContent => validate_content(&cfg),
        Cmd::ValidateFile { bucket, file } => validate_file(&cfg, &bucket, &file),
        Cmd::ShowConfig => show_config(&cfg),
    }
}

fn validate_content(cfg: &ConfigManager) -> Result<()> {
    let report = content::validate(&ContentPaths::from_config(cfg))?;
    match report.outcome {
        ValidationOutcome::AllValid { checked } => {
            println!("OK: {checked} file(s), {} bucket(s) without schema", report.skipped_buckets.len());
            Ok(())
        }
        ValidationOutcome::NotApplicable => bail!("content directories are missing"),
        ValidationOutcome::NoSchemasFound => bail!("no schema files under {}", cfg.schemas_dir().display()),
        ValidationOutcome::ValidationFailures(failures) => {
            for f in &failures {
                eprintln!("- {}: {}", f.display_path(cfg.repo_root()).display(), f.message);
            }
            bail!("{} invalid content file(s)", failures.len())
        }
    }
}

fn validate_file(cfg: &ConfigManager, bucket: &str, path: &PathBuf) -> Result<()> {
    let registry = SchemaRegistry::load(&cfg.schemas_dir())?;
    let Some(result) = registry.check(bucket, path) else {
        bail!("no schema named '{bucket}' (known: {})", registry.names().join(", "));
    };
    if let Err(err) = result {
        eprintln!("Invalid: {}", path.display());
        eprintln!("- {err}");
        std::process::exit(2);
    }
    println!("OK: {}", path.display());
    Ok(())
}

fn show_config(cfg: &ConfigManager) -> Result<()> {
    println!("repo root: {}", cfg.repo_root().display());
    for scope in [Scope::User, Scope::Workspace] {
        match cfg.scope_dir(scope) {
            Some(dir) => println!("{scope:?} layer: {}", dir.display()),
            None => println!("{scope:?} layer: (none)"),
        }
    }
    println!("schemas: {}", cfg.schemas_dir().display());
    println!("data: {}", cfg.data_dir().display());
    println!("{}", serde_json::to_string_pretty(cfg.get())?);
    Ok(())
}
