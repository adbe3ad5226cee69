// gm-content-tools/src/content.rs
//
// Each subdirectory ("bucket") of the data root is validated against the
// schema named `<bucket>.schema.json` in the schemas root.

use globset::{Glob, GlobBuilder, GlobMatcher};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, fs, path::{Path, PathBuf}};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ConfigManager;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("read {}: {source}", path.display())]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("parse schema {}: {source}", path.display())]
    SchemaParse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("compile schema {}: {message}", path.display())]
    SchemaCompile { path: PathBuf, message: String },
    #[error("glob: {0}")]
    Glob(#[from] globset::Error),
}

/// Why a single payload was rejected. Loading and schema errors are reported
/// the same way; the split only exists for callers that want it.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("{}", .0.join("; "))]
    Schema(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat { Json, Yaml }

impl PayloadFormat {
    /// `None` for files that are not content payloads (docs, binary assets).
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

pub fn load_payload(path: &Path) -> Result<Value, PayloadError> {
    let text = fs::read_to_string(path)?;
    match PayloadFormat::of(path) {
        Some(PayloadFormat::Yaml) => {
            // an empty YAML document is null
            if text.trim().is_empty() { return Ok(Value::Null); }
            Ok(serde_yml::from_str(&text)?)
        }
        _ => Ok(serde_json::from_str(&text)?),
    }
}

/// Compiled Draft 2020-12 validators keyed by schema name.
pub struct SchemaRegistry {
    validators: BTreeMap<String, jsonschema::Validator>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry").field("names", &self.names()).finish()
    }
}

impl SchemaRegistry {
    pub const SUFFIX_GLOB: &'static str = "*.schema.json";

    /// Loads every `<name>.schema.json` directly under `dir`, in lexical order.
    /// A schema that cannot be read, parsed or compiled aborts the load.
    pub fn load(dir: &Path) -> Result<Self, ContentError> {
        let matcher = Glob::new(Self::SUFFIX_GLOB)?.compile_matcher();
        let rd = fs::read_dir(dir).map_err(|source| ContentError::Read { path: dir.to_path_buf(), source })?;
        let mut files: Vec<PathBuf> = entry_paths(rd, dir)
            .filter(|p| p.is_file())
            .filter(|p| p.file_name().is_some_and(|n| matcher.is_match(n)))
            .collect();
        files.sort();

        let mut validators = BTreeMap::new();
        for path in files {
            let Some(name) = schema_name(&path) else { continue; };
            let text = fs::read_to_string(&path).map_err(|source| ContentError::Read { path: path.clone(), source })?;
            let schema: Value = serde_json::from_str(&text)
                .map_err(|source| ContentError::SchemaParse { path: path.clone(), source })?;
            let validator = jsonschema::draft202012::new(&schema)
                .map_err(|e| ContentError::SchemaCompile { path: path.clone(), message: e.to_string() })?;
            debug!(schema = %name, path = %path.display(), "schema compiled");
            validators.insert(name, validator);
        }
        Ok(Self { validators })
    }

    pub fn get(&self, name: &str) -> Option<&jsonschema::Validator> { self.validators.get(name) }
    pub fn len(&self) -> usize { self.validators.len() }
    pub fn is_empty(&self) -> bool { self.validators.is_empty() }
    pub fn names(&self) -> Vec<&str> { self.validators.keys().map(|k| k.as_str()).collect() }

    /// Loads and checks one payload against the named bucket schema.
    /// Returns `None` when no schema exists for `bucket`.
    pub fn check(&self, bucket: &str, path: &Path) -> Option<Result<(), PayloadError>> {
        let validator = self.get(bucket)?;
        Some(check_payload(validator, path))
    }
}

/// Portion of the file name before the first `.`.
fn schema_name(path: &Path) -> Option<String> {
    let file = path.file_name()?.to_str()?;
    let name = file.split('.').next()?;
    Some(name.to_string())
}

fn check_payload(validator: &jsonschema::Validator, path: &Path) -> Result<(), PayloadError> {
    let payload = load_payload(path)?;
    let errors: Vec<String> = validator.iter_errors(&payload).map(|e| e.to_string()).collect();
    if errors.is_empty() { Ok(()) } else { Err(PayloadError::Schema(errors)) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub message: String,
}

impl FailureRecord {
    /// Path relative to `root`, or the full path when it lives elsewhere.
    pub fn display_path(&self, root: &Path) -> PathBuf {
        self.path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| self.path.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Schemas or data root missing: nothing to check.
    NotApplicable,
    NoSchemasFound,
    ValidationFailures(Vec<FailureRecord>),
    AllValid { checked: usize },
}

impl ValidationOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotApplicable | Self::AllValid { .. } => 0,
            Self::NoSchemasFound => 1,
            Self::ValidationFailures(_) => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub outcome: ValidationOutcome,
    pub skipped_buckets: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ContentPaths {
    pub schemas_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ContentPaths {
    pub fn new(schemas_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self { schemas_dir: schemas_dir.into(), data_dir: data_dir.into() }
    }

    pub fn from_config(cfg: &ConfigManager) -> Self {
        Self::new(cfg.schemas_dir(), cfg.data_dir())
    }
}

fn payload_matcher() -> Result<GlobMatcher, ContentError> {
    Ok(GlobBuilder::new("*.{json,yaml,yml}").case_insensitive(true).build()?.compile_matcher())
}

/// Entry paths of one directory listing; unreadable entries are logged and dropped.
fn entry_paths<'a>(rd: fs::ReadDir, dir: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
    rd.filter_map(move |e| match e {
        Ok(entry) => Some(entry.path()),
        Err(err) => {
            warn!(dir = %dir.display(), %err, "unreadable directory entry, skipping");
            None
        }
    })
}

/// Immediate subdirectories of `data_dir`, sorted by name. Names that are not
/// valid UTF-8 can never match a schema and come back as `Err(lossy_name)`.
fn buckets(data_dir: &Path) -> Result<Vec<(Result<String, String>, PathBuf)>, ContentError> {
    let rd = fs::read_dir(data_dir).map_err(|source| ContentError::Read { path: data_dir.to_path_buf(), source })?;
    let mut out: Vec<(Result<String, String>, PathBuf)> = entry_paths(rd, data_dir)
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let name = p.file_name()?;
            let name = name.to_str().map(str::to_string).ok_or_else(|| name.to_string_lossy().into_owned());
            Some((name, p))
        })
        .collect();
    out.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(out)
}

/// Payload files anywhere under `bucket_dir`, in lexical path order. Entries the
/// walk cannot reach (dangling links, unreadable directories, link loops) come
/// back as failures in place instead of ending the walk.
fn payload_files(bucket_dir: &Path, matcher: &GlobMatcher) -> Vec<Result<PathBuf, FailureRecord>> {
    let mut files = vec![];
    for entry in WalkDir::new(bucket_dir).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() { continue; }
                if entry.file_name().to_str().is_some_and(|n| matcher.is_match(n)) {
                    files.push(Ok(entry.into_path()));
                }
            }
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| bucket_dir.to_path_buf());
                let payload_like = path.file_name().and_then(|n| n.to_str()).is_some_and(|n| matcher.is_match(n));
                if payload_like || path.is_dir() || err.loop_ancestor().is_some() {
                    files.push(Err(FailureRecord { path, message: err.to_string() }));
                } else {
                    warn!(path = %path.display(), %err, "unreachable non-content entry, skipping");
                }
            }
        }
    }
    files.sort_by(|a, b| entry_path(a).cmp(entry_path(b)));
    files
}

fn entry_path(item: &Result<PathBuf, FailureRecord>) -> &Path {
    match item {
        Ok(p) => p,
        Err(rec) => &rec.path,
    }
}

/// Runs the whole content check. Per-file problems are collected into the
/// outcome; only a broken schemas root or an unreadable data root is an `Err`.
pub fn validate(paths: &ContentPaths) -> Result<Report, ContentError> {
    if !paths.schemas_dir.exists() || !paths.data_dir.exists() {
        info!(schemas = %paths.schemas_dir.display(), data = %paths.data_dir.display(),
              "content directories are missing; nothing to validate");
        return Ok(Report { outcome: ValidationOutcome::NotApplicable, skipped_buckets: vec![] });
    }

    let registry = SchemaRegistry::load(&paths.schemas_dir)?;
    if registry.is_empty() {
        return Ok(Report { outcome: ValidationOutcome::NoSchemasFound, skipped_buckets: vec![] });
    }
    info!(schemas = registry.len(), "schemas loaded");

    let matcher = payload_matcher()?;
    let mut failures = vec![];
    let mut skipped_buckets = vec![];
    let mut checked = 0usize;
    for (bucket, dir) in buckets(&paths.data_dir)? {
        let bucket = match bucket {
            Ok(name) => name,
            Err(lossy) => {
                warn!(bucket = %lossy, "content bucket name is not valid UTF-8, skipping");
                skipped_buckets.push(lossy);
                continue;
            }
        };
        let Some(validator) = registry.get(&bucket) else {
            warn!(bucket = %bucket, "no schema for content bucket, skipping");
            skipped_buckets.push(bucket);
            continue;
        };
        for item in payload_files(&dir, &matcher) {
            checked += 1;
            let file = match item {
                Ok(file) => file,
                Err(rec) => {
                    debug!(path = %rec.path.display(), err = %rec.message, "unreachable");
                    failures.push(rec);
                    continue;
                }
            };
            match check_payload(validator, &file) {
                Ok(()) => debug!(path = %file.display(), "ok"),
                Err(err) => {
                    debug!(path = %file.display(), %err, "invalid");
                    failures.push(FailureRecord { path: file, message: err.to_string() });
                }
            }
        }
    }

    let outcome = if failures.is_empty() {
        ValidationOutcome::AllValid { checked }
    } else {
        ValidationOutcome::ValidationFailures(failures)
    };
    Ok(Report { outcome, skipped_buckets })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    const WIDGET: &str = r#"{
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["id", "size"],
        "properties": { "id": { "type": "string" }, "size": { "type": "integer", "minimum": 1 } }
    }"#;

    #[test]
    fn schema_name_is_prefix_before_first_dot() {
        assert_eq!(schema_name(Path::new("x/widget.schema.json")).as_deref(), Some("widget"));
        assert_eq!(schema_name(Path::new("weather.v2.schema.json")).as_deref(), Some("weather"));
    }

    #[test]
    fn payload_format_by_extension() {
        assert_eq!(PayloadFormat::of(Path::new("a.JSON")), Some(PayloadFormat::Json));
        assert_eq!(PayloadFormat::of(Path::new("a.Yml")), Some(PayloadFormat::Yaml));
        assert_eq!(PayloadFormat::of(Path::new("a.yaml")), Some(PayloadFormat::Yaml));
        assert_eq!(PayloadFormat::of(Path::new("README.md")), None);
        assert_eq!(PayloadFormat::of(Path::new("noext")), None);
    }

    #[test]
    fn loads_yaml_and_json_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let y = dir.path().join("a.yaml");
        write(&y, "id: rock\nsize: 3\n");
        assert_eq!(load_payload(&y).unwrap(), serde_json::json!({"id": "rock", "size": 3}));
        let j = dir.path().join("b.json");
        write(&j, r#"[1, "two"]"#);
        assert_eq!(load_payload(&j).unwrap(), serde_json::json!([1, "two"]));
        let e = dir.path().join("empty.yml");
        write(&e, "\n");
        assert_eq!(load_payload(&e).unwrap(), Value::Null);
    }

    #[test]
    fn malformed_payloads_error() {
        let dir = tempfile::tempdir().unwrap();
        let j = dir.path().join("bad.json");
        write(&j, "{ nope");
        assert!(matches!(load_payload(&j), Err(PayloadError::Json(_))));
        let y = dir.path().join("bad.yaml");
        write(&y, "key: [unclosed\n");
        assert!(matches!(load_payload(&y), Err(PayloadError::Yaml(_))));
    }

    #[test]
    fn registry_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("widget.schema.json"), WIDGET);
        write(&dir.path().join("gadget.json"), WIDGET);
        write(&dir.path().join("notes.md"), "# schemas");
        let reg = SchemaRegistry::load(dir.path()).unwrap();
        assert_eq!(reg.names(), ["widget"]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn malformed_schema_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("widget.schema.json"), "{ not json");
        assert!(matches!(SchemaRegistry::load(dir.path()), Err(ContentError::SchemaParse { .. })));
    }

    #[test]
    fn uncompilable_schema_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("widget.schema.json"), r#"{"type": 12}"#);
        assert!(matches!(SchemaRegistry::load(dir.path()), Err(ContentError::SchemaCompile { .. })));
    }

    #[test]
    fn check_reports_missing_schema_as_none() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("schemas/widget.schema.json"), WIDGET);
        let payload = dir.path().join("w.json");
        write(&payload, r#"{"id": "a", "size": 2}"#);
        let reg = SchemaRegistry::load(&dir.path().join("schemas")).unwrap();
        assert!(reg.check("gadget", &payload).is_none());
        assert!(reg.check("widget", &payload).unwrap().is_ok());
    }

    #[test]
    fn schema_errors_join_every_violation() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("schemas/widget.schema.json"), WIDGET);
        let payload = dir.path().join("w.json");
        write(&payload, r#"{"size": 0}"#);
        let reg = SchemaRegistry::load(&dir.path().join("schemas")).unwrap();
        let err = reg.check("widget", &payload).unwrap().unwrap_err();
        let PayloadError::Schema(msgs) = &err else { panic!("expected schema error, got {err}") };
        assert_eq!(msgs.len(), 2);
        assert!(err.to_string().contains("; "));
    }

    #[test]
    fn payload_files_are_recursive_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("widget");
        write(&b.join("z.json"), "{}");
        write(&b.join("a/inner.YAML"), "{}");
        write(&b.join("readme.txt"), "");
        write(&b.join("icon.png"), "");
        let files: Vec<PathBuf> = payload_files(&b, &payload_matcher().unwrap()).into_iter().map(Result::unwrap).collect();
        assert_eq!(files, vec![b.join("a/inner.YAML"), b.join("z.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_become_failures_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("widget");
        write(&b.join("c.json"), "{}");
        std::os::unix::fs::symlink(b.join("gone.json"), b.join("a.json")).unwrap();
        std::os::unix::fs::symlink(b.join("gone.png"), b.join("b.png")).unwrap();
        let items = payload_files(&b, &payload_matcher().unwrap());
        assert_eq!(items.len(), 2);
        let Err(rec) = &items[0] else { panic!("dangling payload link should fail") };
        assert_eq!(rec.path, b.join("a.json"));
        assert_eq!(items[1].as_ref().unwrap(), &b.join("c.json"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ValidationOutcome::NotApplicable.exit_code(), 0);
        assert_eq!(ValidationOutcome::AllValid { checked: 3 }.exit_code(), 0);
        assert_eq!(ValidationOutcome::NoSchemasFound.exit_code(), 1);
        assert_eq!(ValidationOutcome::ValidationFailures(vec![]).exit_code(), 2);
    }

    #[test]
    fn display_path_is_repo_relative() {
        let rec = FailureRecord { path: PathBuf::from("/repo/assets/content/data/w/a.json"), message: "x".into() };
        assert_eq!(rec.display_path(Path::new("/repo")), PathBuf::from("assets/content/data/w/a.json"));
        assert_eq!(rec.display_path(Path::new("/elsewhere")), rec.path);
    }
}
