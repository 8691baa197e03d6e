// madj-core/src/shortcut/mod.rs
//! Shortcut Publisher: one launch entry point per install, with every superseded entry point
//! removed first. Publishing twice leaves the same single file behind.

pub mod legacy;
pub mod render;

use std::path::PathBuf;

use madj_common::config::Config;
use madj_common::error::{MadjError, Result};
use madj_common::model::ShortcutEntry;
use tracing::{debug, info, warn};

use crate::fsutil::{atomic_write, make_executable, remove_filesystem_artifact};
pub use legacy::LegacyArtifact;
pub use render::ShortcutFormat;

/// Directories shortcuts are published to or cleaned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutDirs {
    pub desktop: PathBuf,
    pub applications: PathBuf,
    pub install_root: PathBuf,
}

impl ShortcutDirs {
    pub fn from_config(config: &Config) -> Self {
        Self {
            desktop: config.desktop_dir(),
            applications: config.applications_dir(),
            install_root: config.install_root().to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub path: PathBuf,
    pub removed_legacy: Vec<PathBuf>,
    /// Legacy entries that could not be removed; a warning, not a failure.
    pub stuck_legacy: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ShortcutPublisher {
    dirs: ShortcutDirs,
    format: ShortcutFormat,
}

impl ShortcutPublisher {
    pub fn new(dirs: ShortcutDirs) -> Self {
        Self {
            dirs,
            format: ShortcutFormat::native(),
        }
    }

    pub fn with_format(mut self, format: ShortcutFormat) -> Self {
        self.format = format;
        self
    }

    pub fn dirs(&self) -> &ShortcutDirs {
        &self.dirs
    }

    pub fn canonical_path(&self, entry: &ShortcutEntry) -> PathBuf {
        self.format.location(&self.dirs, entry)
    }

    pub fn publish(&self, entry: &ShortcutEntry) -> Result<PublishReport> {
        let canonical = self.canonical_path(entry);
        let mut report = PublishReport {
            path: canonical.clone(),
            ..Default::default()
        };

        for artifact in LegacyArtifact::ALL {
            for path in artifact.paths(&self.dirs) {
                if path == canonical {
                    continue;
                }
                // Only files and links: a directory with a legacy name is not ours.
                match path.symlink_metadata() {
                    Ok(meta) if !meta.is_dir() => {}
                    _ => continue,
                }
                debug!("Removing {:?} entry {}", artifact, path.display());
                if remove_filesystem_artifact(&path) {
                    report.removed_legacy.push(path);
                } else {
                    warn!("Could not remove old launcher {}", path.display());
                    report.stuck_legacy.push(path);
                }
            }
        }

        let contents = self.format.render(entry);
        atomic_write(&canonical, contents.as_bytes()).map_err(|e| {
            MadjError::Shortcut(format!("Failed to write {}: {e}", canonical.display()))
        })?;
        if self.format.is_executable() {
            make_executable(&canonical).map_err(|e| {
                MadjError::Shortcut(format!(
                    "Failed to mark {} executable: {e}",
                    canonical.display()
                ))
            })?;
        }

        info!(
            "Published shortcut {} ({} old entr{} removed)",
            canonical.display(),
            report.removed_legacy.len(),
            if report.removed_legacy.len() == 1 { "y" } else { "ies" }
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn dirs(tmp: &std::path::Path) -> ShortcutDirs {
        ShortcutDirs {
            desktop: tmp.join("Desktop"),
            applications: tmp.join("applications"),
            install_root: tmp.join("root"),
        }
    }

    fn entry(root: &std::path::Path) -> ShortcutEntry {
        ShortcutEntry::for_launcher(PathBuf::from("/usr/local/bin/madj"), root.to_path_buf(), None)
    }

    fn plant_legacy(dirs: &ShortcutDirs) -> Vec<PathBuf> {
        let planted = vec![
            dirs.desktop.join("Market Adjuster.bat"),
            dirs.desktop.join("Market Adjuster.url"),
            dirs.desktop.join("Market Adjuster.desktop"),
            dirs.install_root.join("launch.sh"),
            dirs.applications.join("market-adjuster-0.9.desktop"),
        ];
        for path in &planted {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "old").unwrap();
        }
        planted
    }

    fn all_candidate_files(dirs: &ShortcutDirs) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in [&dirs.desktop, &dirs.applications, &dirs.install_root] {
            if let Ok(entries) = fs::read_dir(dir) {
                files.extend(entries.filter_map(|e| e.ok()).map(|e| e.path()));
            }
        }
        files
    }

    #[test]
    fn two_publishes_leave_exactly_one_entry() {
        for format in [
            ShortcutFormat::DesktopEntry,
            ShortcutFormat::CommandScript,
            ShortcutFormat::BatchScript,
        ] {
            let tmp = tempfile::tempdir().unwrap();
            let dirs = dirs(tmp.path());
            let planted = plant_legacy(&dirs);
            let publisher = ShortcutPublisher::new(dirs.clone()).with_format(format);
            let entry = entry(&dirs.install_root);

            let first = publisher.publish(&entry).unwrap();
            assert_eq!(first.removed_legacy.len(), planted.len());
            let second = publisher.publish(&entry).unwrap();
            assert!(second.removed_legacy.is_empty());
            assert_eq!(first.path, second.path);

            assert_eq!(all_candidate_files(&dirs), vec![first.path.clone()]);
            for path in &planted {
                assert!(!path.exists(), "{} survived", path.display());
            }
        }
    }

    #[test]
    fn canonical_name_shared_with_a_legacy_kind_is_kept() {
        // `Market Adjuster.cmd` is both the Windows canonical entry and a legacy desktop name.
        let tmp = tempfile::tempdir().unwrap();
        let dirs = dirs(tmp.path());
        let publisher =
            ShortcutPublisher::new(dirs.clone()).with_format(ShortcutFormat::BatchScript);
        let entry = entry(&dirs.install_root);

        publisher.publish(&entry).unwrap();
        let report = publisher.publish(&entry).unwrap();
        assert!(report.path.is_file());
        assert!(report.removed_legacy.is_empty());
    }

    #[test]
    fn directory_with_legacy_name_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = dirs(tmp.path());
        let user_dir = dirs.install_root.join("launch.sh");
        fs::create_dir_all(&user_dir).unwrap();

        let report = ShortcutPublisher::new(dirs.clone())
            .with_format(ShortcutFormat::DesktopEntry)
            .publish(&entry(&dirs.install_root))
            .unwrap();
        assert!(user_dir.is_dir());
        assert!(report.removed_legacy.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unix_entries_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dirs = dirs(tmp.path());
        let report = ShortcutPublisher::new(dirs.clone())
            .with_format(ShortcutFormat::CommandScript)
            .publish(&entry(&dirs.install_root))
            .unwrap();
        let mode = fs::metadata(&report.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
