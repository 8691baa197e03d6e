// madj-common/src/model/installation.rs
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;

/// Fresh vs. Update. Presentation only: nothing that reconciles files or environments may
/// branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fresh,
    Update,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fresh => write!(f, "fresh install"),
            Mode::Update => write!(f, "update"),
        }
    }
}

/// Snapshot of one install's on-disk footprint, taken once before a run starts.
#[derive(Debug, Clone)]
pub struct InstallationState {
    pub root: PathBuf,
    pub marker_path: PathBuf,
    pub marker_present: bool,
    pub environment_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl InstallationState {
    pub fn read(config: &Config) -> Self {
        let marker_path = config.app_entry_path();
        let marker_present = marker_path.is_file();
        debug!(
            "Marker file {} present: {}",
            marker_path.display(),
            marker_present
        );
        Self {
            root: config.install_root().to_path_buf(),
            marker_path,
            marker_present,
            environment_path: config.canonical_environment_path(),
            logs_dir: config.logs_dir(),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.marker_present {
            Mode::Update
        } else {
            Mode::Fresh
        }
    }
}
