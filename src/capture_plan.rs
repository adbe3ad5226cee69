// gm-content-tools/src/capture_plan.rs
//
// Perf capture plans are consumed by the perf-machine job runner; CI only
// generates them (no GPU there), it never launches the game.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use tracing::{debug, info};

use crate::{config::ConfigManager, scenarios::{ScenarioDef, ScenarioId}};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, #[source] source: std::io::Error },
    #[error("write plan {}: {source}", path.display())]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("serialize plan: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How a scenario turns into a game invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    pub executable: String,
    pub extra_args: Vec<String>, // between the executable and the capture flags
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self { executable: crate::config::DEFAULT_EXECUTABLE.into(), extra_args: vec!["--headless".into()] }
    }
}

impl CommandTemplate {
    pub fn from_config(cfg: &ConfigManager) -> Self {
        Self { executable: cfg.executable(), extra_args: cfg.extra_args() }
    }

    pub fn render(&self, def: &ScenarioDef) -> String {
        let mut parts = Vec::with_capacity(self.extra_args.len() + 5);
        parts.push(self.executable.clone());
        parts.extend(self.extra_args.iter().cloned());
        parts.push("--perf-capture".into());
        parts.push(def.profiling_preset.into());
        parts.push("--seconds".into());
        parts.push(def.duration_seconds.to_string());
        parts.join(" ")
    }
}

/// One scenario as emitted in the plan. Field order is the JSON field order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub profiling_preset: String,
    pub duration_seconds: u32,
    pub capture_types: Vec<String>,
    pub description: String,
    pub notes: Vec<String>,
    pub name: String,
    pub timestamp: String,
    pub commands: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub generated_at: String,
    pub scenarios: Vec<PlanEntry>,
}

impl Plan {
    pub fn to_json_pretty(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.scenarios.iter().map(|e| e.name.as_str()).collect();
        format!("{} scenario(s): {}", names.len(), names.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    DryRun(PathBuf),
    Written(PathBuf),
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Projects the selected scenarios, in the order given. An empty selection
/// means every known scenario in lexical order.
pub fn build_plan(selected: &[ScenarioId], generated_at: DateTime<Utc>, template: &CommandTemplate) -> Plan {
    let timestamp = format_timestamp(generated_at);
    let ids: Vec<ScenarioId> = if selected.is_empty() { ScenarioId::ALL.to_vec() } else { selected.to_vec() };
    let scenarios = ids.iter().map(|id| {
        let def = id.def();
        PlanEntry {
            profiling_preset: def.profiling_preset.into(),
            duration_seconds: def.duration_seconds,
            capture_types: def.capture_types.iter().map(|s| s.to_string()).collect(),
            description: def.description.into(),
            notes: def.notes.iter().map(|s| s.to_string()).collect(),
            name: id.as_str().into(),
            timestamp: timestamp.clone(),
            commands: vec![template.render(def)],
        }
    }).collect();
    Plan { generated_at: timestamp, scenarios }
}

/// Parent directories are created even for a dry run; the plan file itself
/// is only touched when `dry_run` is false.
pub fn write_plan(plan: &Plan, output: &Path, dry_run: bool) -> Result<WriteOutcome, PlanError> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| PlanError::CreateDir { path: dir.to_path_buf(), source })?;
    }
    if dry_run {
        debug!(path = %output.display(), "dry run, plan not written");
        return Ok(WriteOutcome::DryRun(output.to_path_buf()));
    }
    let text = plan.to_json_pretty()?;
    fs::write(output, text).map_err(|source| PlanError::Write { path: output.to_path_buf(), source })?;
    info!(path = %output.display(), scenarios = plan.scenarios.len(), "capture plan written");
    Ok(WriteOutcome::Written(output.to_path_buf()))
}

/// Builds the plan and persists it when an output path is given.
pub fn generate(
    selected: &[ScenarioId],
    output: Option<&Path>,
    dry_run: bool,
    now: DateTime<Utc>,
    template: &CommandTemplate,
) -> Result<(Plan, Option<WriteOutcome>), PlanError> {
    let plan = build_plan(selected, now, template);
    let outcome = match output {
        Some(path) => Some(write_plan(&plan, path, dry_run)?),
        None => None,
    };
    Ok((plan, outcome))
}
