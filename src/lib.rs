pub mod config;
pub mod scenarios;
pub mod capture_plan;
pub mod content;

pub use config::{ConfigManager, ToolsConfig, Scope};
pub use scenarios::{ScenarioId, ScenarioDef};
pub use capture_plan::{build_plan, generate, write_plan, CommandTemplate, Plan, PlanEntry, PlanError, WriteOutcome};
pub use content::{validate, ContentError, ContentPaths, FailureRecord, Report, SchemaRegistry, ValidationOutcome};

/// Installs the stderr fmt subscriber used by every binary; `RUST_LOG` wins over `default`.
pub fn init_tracing(default: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
