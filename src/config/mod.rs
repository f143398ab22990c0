use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use crate::grouping::GroupKind;
use crate::list::ListType;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesList";
const APP_NAME: &str = "notelist";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub library_path: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("NOTELIST_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("NOTELIST_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));

        Ok(Self::layout(config_dir, config_file, data_root, state_dir))
    }

    /// Everything under one root directory; used for tests and portable installs.
    pub fn rooted(root: &Path) -> Self {
        let config_dir = root.join("config");
        Self::layout(
            config_dir.clone(),
            config_dir.join("config.toml"),
            root.join("data"),
            root.join("state"),
        )
    }

    fn layout(
        config_dir: PathBuf,
        config_file: PathBuf,
        data_dir: PathBuf,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            library_path: data_dir.join("library.json"),
            log_dir: state_dir.join("logs"),
            config_dir,
            config_file,
            data_dir,
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_view: ListType,
    pub group_by: GroupKind,
    /// Terminals narrower than this get compact toast placement.
    pub compact_width: u16,
    /// Empty means `<data dir>/library.json`.
    pub library_path: PathBuf,
    pub list: ListOptions,
    pub toast: ToastOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_view: ListType::Notes,
            group_by: GroupKind::Default,
            compact_width: 80,
            library_path: PathBuf::new(),
            list: ListOptions::default(),
            toast: ToastOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        if self.library_path.as_os_str().is_empty() {
            self.library_path = paths.library_path.clone();
        }
        if self.list.wheel_step == 0 {
            tracing::warn!("list.wheel_step must be positive, using 1");
            self.list.wheel_step = 1;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListOptions {
    /// Rows rendered beyond each edge of the viewport.
    pub overscan_rows: usize,
    pub smooth_scroll_ms: u64,
    pub wheel_step: u16,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            overscan_rows: 2,
            smooth_scroll_ms: 180,
            wheel_step: 3,
        }
    }
}

impl ListOptions {
    pub fn smooth_scroll(&self) -> Duration {
        Duration::from_millis(self.smooth_scroll_ms)
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToastOptions {
    #[serde_as(as = "DurationSeconds<u64>")]
    pub hide_after: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub error_hide_after: Duration,
    /// Used for any toast that offers actions, whatever its kind.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub action_hide_after: Duration,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            hide_after: Duration::from_secs(3),
            error_hide_after: Duration::from_secs(5),
            action_hide_after: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn first_run_writes_defaults_and_resolves_the_library() -> Result<()> {
        let dir = tempdir()?;
        let loader = ConfigLoader::from_paths(ConfigPaths::rooted(dir.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert!(loader.paths().log_dir.is_dir());
        assert_eq!(cfg.library_path, dir.path().join("data").join("library.json"));

        let written = fs::read_to_string(&loader.paths().config_file)?;
        assert!(written.contains("group_by = \"default\""), "{written}");
        assert!(written.contains("hide_after = 3"), "{written}");
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() -> Result<()> {
        let dir = tempdir()?;
        let paths = ConfigPaths::rooted(dir.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "default_view = \"tags\"\ngroup_by = \"month\"\n\n[list]\nwheel_step = 0\n\n[toast]\nerror_hide_after = 9\n",
        )?;
        let cfg = ConfigLoader::from_paths(paths).load()?;
        assert_eq!(cfg.default_view, ListType::Tags);
        assert_eq!(cfg.group_by, GroupKind::Month);
        assert_eq!(cfg.list.wheel_step, 1);
        assert_eq!(cfg.list.overscan_rows, 2);
        assert_eq!(cfg.toast.error_hide_after, Duration::from_secs(9));
        assert_eq!(cfg.toast.hide_after, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn unknown_view_names_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let paths = ConfigPaths::rooted(dir.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "default_view = \"archive\"\n")?;
        let err = ConfigLoader::from_paths(paths).load().unwrap_err();
        assert!(format!("{err:#}").contains("parsing config toml"));
        Ok(())
    }
}
