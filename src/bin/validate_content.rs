// gm-content-tools/src/bin/validate_content.rs
//
// Validates content records under assets/content/data against the schemas in
// assets/content/schemas. Exit status: 0 nothing to do or all valid, 1 schema
// setup broken, 2 content invalid.

use clap::Parser;
use gm_content_tools::{content, init_tracing, ConfigManager, ContentPaths, ValidationOutcome};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "validate-content", version, about = "Validate content data files against their bucket schemas.")]
struct Args {}

fn main() -> ExitCode {
    init_tracing("info");
    let _ = Args::parse();

    let cfg = match ConfigManager::discover() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("cannot resolve repository root: {err}");
            return ExitCode::from(1);
        }
    };
    let paths = ContentPaths::from_config(&cfg);
    let report = match content::validate(&paths) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Schema setup is broken: {err}");
            return ExitCode::from(1);
        }
    };

    match &report.outcome {
        ValidationOutcome::NotApplicable => {}
        ValidationOutcome::NoSchemasFound => eprintln!("No schema files were found; aborting"),
        ValidationOutcome::ValidationFailures(failures) => {
            println!("Schema validation failures detected:");
            for f in failures {
                println!("  - {}: {}", f.display_path(cfg.repo_root()).display(), f.message);
            }
        }
        ValidationOutcome::AllValid { checked } => {
            println!("All content files satisfied their schemas. ({checked} checked)");
        }
    }
    ExitCode::from(report.outcome.exit_code() as u8)
}
