// madj-core/src/shortcut/legacy.rs
use std::fs;
use std::path::PathBuf;

use super::ShortcutDirs;

/// Launch entry points written by earlier installers. Each one is removed before the current
/// entry is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyArtifact {
    /// `Market Adjuster.bat` on the Desktop (first batch-file installer).
    DesktopBatchLauncher,
    /// A `.url` internet shortcut that pointed straight at the service URL.
    DesktopUrlShortcut,
    /// Shell and desktop-file launchers that used to be dropped on the Desktop.
    DesktopShellLauncher,
    /// `launch.*` / `run_app.*` scripts in the install root.
    RootLauncherScript,
    /// `market-adjuster-<version>.desktop` entries in the applications directory.
    VersionedDesktopEntry,
}

const DESKTOP_BATCH_NAMES: &[&str] = &["Market Adjuster.bat", "MarketAdjuster.bat"];
const DESKTOP_URL_NAMES: &[&str] = &["Market Adjuster.url", "MarketAdjuster.url"];
const DESKTOP_SHELL_NAMES: &[&str] = &[
    "Market Adjuster.sh",
    "Market Adjuster.command",
    "Market Adjuster.cmd",
    "Market Adjuster.desktop",
];
const ROOT_SCRIPT_NAMES: &[&str] = &[
    "launch.bat",
    "launch.sh",
    "launch.command",
    "run_app.bat",
    "run_app.sh",
];
const VERSIONED_ENTRY_PREFIX: &str = "market-adjuster-";
const DESKTOP_ENTRY_SUFFIX: &str = ".desktop";

impl LegacyArtifact {
    pub const ALL: [LegacyArtifact; 5] = [
        LegacyArtifact::DesktopBatchLauncher,
        LegacyArtifact::DesktopUrlShortcut,
        LegacyArtifact::DesktopShellLauncher,
        LegacyArtifact::RootLauncherScript,
        LegacyArtifact::VersionedDesktopEntry,
    ];

    /// Concrete paths this kind may occupy. Paths may not exist; the canonical entry may be
    /// among them and is filtered out by the publisher.
    pub fn paths(&self, dirs: &ShortcutDirs) -> Vec<PathBuf> {
        match self {
            Self::DesktopBatchLauncher => join_all(&dirs.desktop, DESKTOP_BATCH_NAMES),
            Self::DesktopUrlShortcut => join_all(&dirs.desktop, DESKTOP_URL_NAMES),
            Self::DesktopShellLauncher => join_all(&dirs.desktop, DESKTOP_SHELL_NAMES),
            Self::RootLauncherScript => join_all(&dirs.install_root, ROOT_SCRIPT_NAMES),
            Self::VersionedDesktopEntry => {
                let Ok(entries) = fs::read_dir(&dirs.applications) else {
                    return Vec::new();
                };
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| {
                        let name = entry.file_name();
                        let name = name.to_string_lossy();
                        name.starts_with(VERSIONED_ENTRY_PREFIX)
                            && name.ends_with(DESKTOP_ENTRY_SUFFIX)
                    })
                    .map(|entry| entry.path())
                    .collect();
                found.sort();
                found
            }
        }
    }
}

fn join_all(dir: &std::path::Path, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|name| dir.join(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_entries_are_discovered_by_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ShortcutDirs {
            desktop: tmp.path().join("Desktop"),
            applications: tmp.path().join("applications"),
            install_root: tmp.path().join("root"),
        };
        fs::create_dir_all(&dirs.applications).unwrap();
        for name in [
            "market-adjuster-1.2.desktop",
            "market-adjuster-2.0.desktop",
            "market-adjuster.desktop",
            "firefox.desktop",
        ] {
            fs::write(dirs.applications.join(name), "").unwrap();
        }

        let paths = LegacyArtifact::VersionedDesktopEntry.paths(&dirs);
        assert_eq!(
            paths,
            vec![
                dirs.applications.join("market-adjuster-1.2.desktop"),
                dirs.applications.join("market-adjuster-2.0.desktop"),
            ]
        );
    }

    #[test]
    fn missing_applications_dir_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ShortcutDirs {
            desktop: tmp.path().join("Desktop"),
            applications: tmp.path().join("nope"),
            install_root: tmp.path().to_path_buf(),
        };
        assert!(LegacyArtifact::VersionedDesktopEntry.paths(&dirs).is_empty());
        assert_eq!(LegacyArtifact::RootLauncherScript.paths(&dirs).len(), 5);
    }
}
