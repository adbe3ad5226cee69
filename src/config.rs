// gm-content-tools/src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use tracing::{debug, warn};

pub const ROOT_ENV: &str = "GM_REPO_ROOT";
pub const WORKSPACE_CONFIG_DIR: &str = ".gmtools";

pub const DEFAULT_SCHEMAS_DIR: &str = "assets/content/schemas";
pub const DEFAULT_DATA_DIR: &str = "assets/content/data";
pub const DEFAULT_EXECUTABLE: &str = "./GotMilked";

/// Config is merged: user -> workspace. Every key is optional so a layer only
/// overrides what it names.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub content: ContentConfig,
    pub capture: CaptureConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    pub schemas_dir: Option<PathBuf>, // relative to repo root
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub executable: Option<String>,
    pub extra_args: Option<Vec<String>>, // default: ["--headless"]
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope { User, Workspace }

/// Resolved config plus the repository root it was loaded for.
#[derive(Clone, Debug)]
pub struct ConfigManager {
    repo_root: PathBuf,
    user_dir: Option<PathBuf>,
    workspace_dir: PathBuf,
    merged: ToolsConfig,
}

impl ConfigManager {
    /// Repo root comes from `GM_REPO_ROOT`, else the current directory.
    pub fn discover() -> std::io::Result<Self> {
        let root = match std::env::var_os(ROOT_ENV) {
            Some(r) if !r.is_empty() => PathBuf::from(r),
            _ => std::env::current_dir()?,
        };
        Ok(Self::load(root))
    }

    pub fn load(repo_root: impl AsRef<Path>) -> Self {
        let user_dir = ProjectDirs::from("dev", "gotmilked", "gm-content-tools")
            .map(|p| p.config_dir().to_path_buf());
        Self::load_with_dirs(repo_root, user_dir)
    }

    /// Same as [`ConfigManager::load`] with an explicit user layer (or none).
    pub fn load_with_dirs(repo_root: impl AsRef<Path>, user_dir: Option<PathBuf>) -> Self {
        let repo_root = repo_root.as_ref().to_path_buf();
        let workspace_dir = repo_root.join(WORKSPACE_CONFIG_DIR);
        let mut me = Self { repo_root, user_dir, workspace_dir, merged: ToolsConfig::default() };
        me.reload_all();
        me
    }

    fn read_yaml_dir(dir: &Path) -> ToolsConfig {
        // Merge all *.yaml in directory (lexicographic order)
        let mut cfg = ToolsConfig::default();
        let Ok(rd) = fs::read_dir(dir) else { return cfg; };
        let mut files: Vec<PathBuf> = rd.filter_map(|e| e.ok().map(|x| x.path()))
                                        .filter(|p| p.extension().is_some_and(|e| e=="yaml"||e=="yml"))
                                        .collect();
        files.sort();
        for f in files {
            let text = match fs::read_to_string(&f) {
                Ok(t) => t,
                Err(err) => { warn!(path = %f.display(), %err, "unreadable config file, skipping"); continue; }
            };
            match serde_yml::from_str::<Option<ToolsConfig>>(&text) {
                Ok(Some(part)) => { debug!(path = %f.display(), "config layer"); merge(&mut cfg, &part); }
                Ok(None) => {}
                Err(err) => warn!(path = %f.display(), %err, "malformed config file, skipping"),
            }
        }
        cfg
    }

    pub fn reload_all(&mut self) {
        let mut merged = ToolsConfig::default();
        if let Some(user) = &self.user_dir {
            merge(&mut merged, &Self::read_yaml_dir(user));
        }
        merge(&mut merged, &Self::read_yaml_dir(&self.workspace_dir));
        self.merged = merged;
    }

    pub fn get(&self) -> &ToolsConfig { &self.merged }
    pub fn repo_root(&self) -> &Path { &self.repo_root }

    pub fn scope_dir(&self, scope: Scope) -> Option<&Path> {
        match scope {
            Scope::User => self.user_dir.as_deref(),
            Scope::Workspace => Some(&self.workspace_dir),
        }
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.rooted(self.merged.content.schemas_dir.as_deref(), DEFAULT_SCHEMAS_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.rooted(self.merged.content.data_dir.as_deref(), DEFAULT_DATA_DIR)
    }

    pub fn executable(&self) -> String {
        self.merged.capture.executable.clone().unwrap_or_else(|| DEFAULT_EXECUTABLE.into())
    }

    pub fn extra_args(&self) -> Vec<String> {
        self.merged.capture.extra_args.clone().unwrap_or_else(|| vec!["--headless".into()])
    }

    fn rooted(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        // absolute paths in config win over the repo root
        self.repo_root.join(configured.unwrap_or_else(|| Path::new(default)))
    }
}

fn merge(a: &mut ToolsConfig, b: &ToolsConfig) {
    macro_rules! ov { ($dst:expr, $src:expr) => { if $src.is_some() { $dst = $src.clone(); } } }

    ov!(a.content.schemas_dir, b.content.schemas_dir);
    ov!(a.content.data_dir, b.content.data_dir);
    ov!(a.capture.executable, b.capture.executable);
    ov!(a.capture.extra_args, b.capture.extra_args);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn defaults_without_any_layer() {
        let root = tempfile::tempdir().unwrap();
        let cfg = ConfigManager::load_with_dirs(root.path(), None);
        assert_eq!(cfg.schemas_dir(), root.path().join("assets/content/schemas"));
        assert_eq!(cfg.data_dir(), root.path().join("assets/content/data"));
        assert_eq!(cfg.executable(), "./GotMilked");
        assert_eq!(cfg.extra_args(), vec!["--headless".to_string()]);
    }

    #[test]
    fn workspace_overrides_user_layer() {
        let root = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write(user.path(), "tools.yaml", "capture:\n  executable: ./Game\ncontent:\n  data_dir: user/data\n");
        write(&root.path().join(WORKSPACE_CONFIG_DIR), "10-content.yaml", "content:\n  data_dir: content/data\n");

        let cfg = ConfigManager::load_with_dirs(root.path(), Some(user.path().to_path_buf()));
        assert_eq!(cfg.executable(), "./Game");
        assert_eq!(cfg.data_dir(), root.path().join("content/data"));
        assert_eq!(cfg.schemas_dir(), root.path().join("assets/content/schemas"));
    }

    #[test]
    fn later_files_win_and_malformed_files_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(WORKSPACE_CONFIG_DIR);
        write(&dir, "10-a.yaml", "capture:\n  extra_args: []\n");
        write(&dir, "20-b.yml", "capture:\n  executable: ./b\n");
        write(&dir, "30-broken.yaml", "capture: [unterminated\n");
        write(&dir, "notes.txt", "capture:\n  executable: ./ignored\n");

        let cfg = ConfigManager::load_with_dirs(root.path(), None);
        assert_eq!(cfg.executable(), "./b");
        assert!(cfg.extra_args().is_empty());
    }

    #[test]
    fn absolute_config_paths_ignore_repo_root() {
        let root = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let text = format!("content:\n  schemas_dir: {}\n", elsewhere.path().display());
        write(&root.path().join(WORKSPACE_CONFIG_DIR), "paths.yaml", &text);

        let cfg = ConfigManager::load_with_dirs(root.path(), None);
        assert_eq!(cfg.schemas_dir(), elsewhere.path());
    }
}
