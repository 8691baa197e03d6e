// madj-common/src/model/shortcut.rs
use std::path::PathBuf;

pub const SHORTCUT_DISPLAY_NAME: &str = "Market Adjuster";

/// A persisted launch entry point: activating it runs `target args...` in `working_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub name: String,
    pub target: PathBuf,
    pub args: Vec<String>,
    pub icon: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl ShortcutEntry {
    /// Entry that re-runs `<launcher> --root <root> launch`.
    pub fn for_launcher(launcher: PathBuf, install_root: PathBuf, icon: Option<PathBuf>) -> Self {
        Self {
            name: SHORTCUT_DISPLAY_NAME.to_string(),
            target: launcher,
            args: vec![
                "--root".to_string(),
                install_root.to_string_lossy().into_owned(),
                "launch".to_string(),
            ],
            icon,
            working_dir: install_root,
        }
    }
}
