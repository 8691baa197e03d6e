// madj-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, UserDirs};
use serde::Deserialize;
use tracing::debug;

use super::error::{MadjError, Result};
use crate::model::manifest::DEFAULT_REQUIREMENTS;
use crate::model::source::SourceResource;

pub const DEFAULT_PORT: u16 = 8501;
pub const LOOPBACK_HOST: &str = "127.0.0.1";

const INSTALL_DIR_NAME: &str = "MarketAdjuster";
const APP_DIR_NAME: &str = "app";
const LOGS_DIR_NAME: &str = "logs";
const CONFIG_FILENAME: &str = "madj.toml";
const DEFAULT_APP_ENTRY: &str = "market_condition_app.py";
const REQUIREMENTS_FILENAME: &str = "requirements.txt";
#[cfg(windows)]
const ICON_FILENAME: &str = "icon.ico";
#[cfg(not(windows))]
const ICON_FILENAME: &str = "icon.png";

// Canonical name first; the rest are names earlier installers used.
const DEFAULT_ENVIRONMENT_NAMES: &[&str] = &["venv", ".venv", "env"];

const DEFAULT_READINESS_BUDGET: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(750);

#[derive(Debug, Clone)]
pub struct Config {
    pub install_root: PathBuf,
    pub port: u16,
    pub app_entry: String,
    pub source_base_url: Option<String>,
    pub fallback_dir: Option<PathBuf>,
    pub python: Option<PathBuf>,
    /// Environment directory names under the install root, in reuse precedence order.
    pub environment_names: Vec<String>,
    pub readiness_budget: Duration,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
    pub sync_on_launch: bool,
    pub open_browser: bool,
    pub requirements: Vec<String>,
}

/// Shape of `<installRoot>/madj.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub app_entry: Option<String>,
    pub source_base_url: Option<String>,
    pub fallback_dir: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub environment_names: Option<Vec<String>>,
    pub wait_secs: Option<u64>,
    pub poll_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
    pub sync_on_launch: Option<bool>,
    pub open_browser: Option<bool>,
    pub requirements: Option<Vec<String>>,
}

impl Config {
    /// Defaults, then `madj.toml`, then `MADJ_*` environment variables.
    pub fn load(root_override: Option<PathBuf>) -> Result<Self> {
        debug!("Loading madj configuration");

        let install_root = root_override
            .or_else(|| env::var("MADJ_ROOT").ok().filter(|s| !s.is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_install_root);
        debug!("Effective install root: {}", install_root.display());

        let mut config = Self::with_root(install_root);

        let file_path = config.config_file_path();
        if file_path.is_file() {
            debug!("Reading config file {}", file_path.display());
            let raw = std::fs::read_to_string(&file_path)?;
            let file_config: FileConfig = toml::from_str(&raw).map_err(|e| {
                MadjError::Config(format!("Invalid config file {}: {e}", file_path.display()))
            })?;
            config.apply_file(file_config);
        } else {
            debug!("No config file at {}, using defaults", file_path.display());
        }

        config.apply_env(|key| env::var(key).ok());
        if config.fallback_dir.is_none() {
            config.fallback_dir = executable_dir();
        }
        config.validate()?;

        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    /// Built-in defaults for an install rooted at `install_root`. No I/O.
    pub fn with_root(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            port: DEFAULT_PORT,
            app_entry: DEFAULT_APP_ENTRY.to_string(),
            source_base_url: None,
            fallback_dir: None,
            python: None,
            environment_names: DEFAULT_ENVIRONMENT_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            readiness_budget: DEFAULT_READINESS_BUDGET,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            sync_on_launch: true,
            open_browser: true,
            requirements: DEFAULT_REQUIREMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(entry) = file.app_entry {
            self.app_entry = entry;
        }
        if file.source_base_url.is_some() {
            self.source_base_url = file.source_base_url;
        }
        if file.fallback_dir.is_some() {
            self.fallback_dir = file.fallback_dir;
        }
        if file.python.is_some() {
            self.python = file.python;
        }
        if let Some(names) = file.environment_names.filter(|n| !n.is_empty()) {
            self.environment_names = names;
        }
        if let Some(secs) = file.wait_secs {
            self.readiness_budget = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = file.probe_timeout_ms {
            self.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(flag) = file.sync_on_launch {
            self.sync_on_launch = flag;
        }
        if let Some(flag) = file.open_browser {
            self.open_browser = flag;
        }
        if let Some(requirements) = file.requirements {
            self.requirements = requirements;
        }
    }

    /// Applies `MADJ_*` overrides. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("MADJ_PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(url) = get("MADJ_SOURCE_URL") {
            self.source_base_url = Some(url);
        }
        if let Some(dir) = get("MADJ_FALLBACK_DIR") {
            self.fallback_dir = Some(PathBuf::from(dir));
        }
        if let Some(python) = get("MADJ_PYTHON") {
            self.python = Some(PathBuf::from(python));
        }
        if let Some(secs) = get("MADJ_WAIT_SECS").and_then(|v| v.trim().parse::<u64>().ok()) {
            self.readiness_budget = Duration::from_secs(secs);
        }
        if let Some(ms) = get("MADJ_POLL_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            self.poll_interval = Duration::from_millis(ms);
        }
        if get("MADJ_NO_BROWSER").is_some_and(|v| v == "1") {
            self.open_browser = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(MadjError::Config("port must be non-zero".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(MadjError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval > self.readiness_budget {
            return Err(MadjError::Config(format!(
                "poll interval ({:?}) must not exceed the readiness budget ({:?})",
                self.poll_interval, self.readiness_budget
            )));
        }
        if self.environment_names.is_empty() {
            return Err(MadjError::Config(
                "at least one environment name is required".to_string(),
            ));
        }
        if self.app_entry.trim().is_empty() {
            return Err(MadjError::Config("app entry file name is empty".to_string()));
        }
        Ok(())
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn app_dir(&self) -> PathBuf {
        self.install_root.join(APP_DIR_NAME)
    }

    /// The marker file: its presence means a previous install completed.
    pub fn app_entry_path(&self) -> PathBuf {
        self.app_dir().join(&self.app_entry)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.app_dir().join(REQUIREMENTS_FILENAME)
    }

    pub fn icon_path(&self) -> PathBuf {
        self.app_dir().join(ICON_FILENAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.install_root.join(LOGS_DIR_NAME)
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.install_root.join(CONFIG_FILENAME)
    }

    /// Candidate environment directories, canonical first.
    pub fn environment_candidates(&self) -> Vec<PathBuf> {
        self.environment_names
            .iter()
            .map(|name| self.install_root.join(name))
            .collect()
    }

    pub fn canonical_environment_path(&self) -> PathBuf {
        self.install_root.join(&self.environment_names[0])
    }

    pub fn service_url(&self) -> String {
        format!("http://{LOOPBACK_HOST}:{}", self.port)
    }

    /// The files every install/update keeps current, relative to the install root.
    pub fn source_resources(&self) -> Vec<SourceResource> {
        let app = PathBuf::from(APP_DIR_NAME);
        vec![
            SourceResource::new(&self.app_entry, app.join(&self.app_entry)),
            SourceResource::new(REQUIREMENTS_FILENAME, app.join(REQUIREMENTS_FILENAME)),
            SourceResource::new(ICON_FILENAME, app.join(ICON_FILENAME)),
        ]
    }

    pub fn home_dir(&self) -> PathBuf {
        UserDirs::new().map_or_else(|| PathBuf::from("/"), |ud| ud.home_dir().to_path_buf())
    }

    pub fn desktop_dir(&self) -> PathBuf {
        UserDirs::new()
            .and_then(|ud| ud.desktop_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| self.home_dir().join("Desktop"))
    }

    /// Where freedesktop launchers live; only meaningful on Linux/BSD.
    pub fn applications_dir(&self) -> PathBuf {
        BaseDirs::new().map_or_else(
            || self.home_dir().join(".local/share/applications"),
            |bd| bd.data_dir().join("applications"),
        )
    }
}

fn default_install_root() -> PathBuf {
    match BaseDirs::new() {
        Some(dirs) => dirs.data_local_dir().join(INSTALL_DIR_NAME),
        None => {
            debug!("No platform data directory; falling back to the current directory");
            PathBuf::from(INSTALL_DIR_NAME)
        }
    }
}

fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
